//! Configuration pretty-printing
// (c) 2026 The rfetch developers

use std::fmt::Display;

use figment::{Metadata, value::Value};
use struct_field_names_as_array::FieldNamesAsSlice as _;
use tabled::{
    Table, Tabled,
    settings::{Color, object::Rows, style::Style},
};

use super::{Configuration, Manager};
use crate::cli::styles::use_colours;

/// One row of output
#[derive(Tabled)]
struct PrettyConfig {
    field: String,
    value: String,
    source: String,
}

impl PrettyConfig {
    fn render_source(meta: Option<&Metadata>) -> String {
        if let Some(m) = meta {
            m.source
                .as_ref()
                .map_or_else(|| m.name.to_string(), figment::Source::to_string)
        } else {
            String::new()
        }
    }

    fn render_value(value: &Value) -> String {
        match value {
            Value::String(_tag, s) => s.to_string(),
            Value::Char(_tag, c) => c.to_string(),
            Value::Bool(_tag, b) => b.to_string(),
            Value::Num(_tag, num) => {
                if let Some(i) = num.to_i128() {
                    i.to_string()
                } else if let Some(u) = num.to_u128() {
                    u.to_string()
                } else if let Some(ff) = num.to_f64() {
                    ff.to_string()
                } else {
                    "<number>".into()
                }
            }
            Value::Empty(_tag, _) => "<empty>".into(),
            Value::Dict(_tag, _dict) => "<table>".into(),
            Value::Array(_tag, vec) => {
                format!(
                    "[{}]",
                    vec.iter()
                        .map(PrettyConfig::render_value)
                        .collect::<Vec<_>>()
                        .join(",")
                )
            }
        }
    }

    fn new<F: Into<String>>(field: F, value: &Value, meta: Option<&Metadata>) -> Self {
        Self {
            field: field.into(),
            value: PrettyConfig::render_value(value),
            source: PrettyConfig::render_source(meta),
        }
    }
}

/// Pretty-printing type wrapper to Manager
#[derive(Debug)]
pub struct DisplayAdapter<'a> {
    /// Data source
    source: &'a Manager,
}

impl Manager {
    /// Creates a `DisplayAdapter` for this struct.
    ///
    /// # Returns
    /// An ephemeral structure implementing `Display`, which lists each field of
    /// [`Configuration`] with its current value and where that value came from.
    #[must_use]
    pub fn to_display_adapter(&self) -> DisplayAdapter<'_> {
        DisplayAdapter { source: self }
    }
}

impl Display for DisplayAdapter<'_> {
    /// N.B. This function uses CLI styling.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = &self.source.data;

        let rows = Configuration::FIELD_NAMES_AS_SLICE
            .iter()
            .filter_map(|field| {
                let value = data.find_value(field).ok()?;
                let meta = data.get_metadata(value.tag());
                Some(PrettyConfig::new(*field, &value, meta))
            });

        let mut table = Table::new(rows);
        let _ = table.with(Style::sharp());
        if use_colours() {
            let _ = table.modify(Rows::first(), Color::FG_YELLOW);
        }
        writeln!(f, "{table}")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use assertables::assert_contains;
    use figment::value::{Tag, Value};
    use pretty_assertions::assert_eq;
    use struct_field_names_as_array::FieldNamesAsSlice as _;

    use super::PrettyConfig;
    use crate::config::{Configuration, ConfigurationOverrides, Manager};

    #[test]
    fn shows_values_and_sources() {
        let mut mgr = Manager::without_files();
        mgr.apply_overrides(&ConfigurationOverrides {
            port: Some(4321),
            ..Default::default()
        });
        let s = console::strip_ansi_codes(&mgr.to_display_adapter().to_string()).to_string();
        let port_line = s.lines().find(|l| l.contains(" port ")).unwrap();
        assert_contains!(port_line, "4321");
        assert_contains!(port_line, "command line");
        let buf_line = s.lines().find(|l| l.contains(" buffer_size ")).unwrap();
        assert_contains!(buf_line, "102400");
        assert_contains!(buf_line, "default");
        for field in Configuration::FIELD_NAMES_AS_SLICE {
            assert_contains!(s, field);
        }
    }

    #[test]
    fn values() {
        let t = Tag::Default;
        assert_eq!(PrettyConfig::render_value(&Value::from("abc")), "abc");
        assert_eq!(PrettyConfig::render_value(&Value::Bool(t, true)), "true");
        assert_eq!(PrettyConfig::render_value(&Value::from(42u16)), "42");
        assert_eq!(
            PrettyConfig::render_value(&Value::from(vec![1u8, 2u8])),
            "[1,2]"
        );
        assert_eq!(PrettyConfig::render_source(None), "");
    }
}
