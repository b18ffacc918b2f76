use serde_json::Value;
use std::fmt::Write as _;

/// Kind of an exported metric. The cluster API only yields point-in-time
/// values, so everything this exporter produces is a gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gauge => "gauge",
        }
    }
}

/// One (label values, value) pair within a metric family.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub label_values: Vec<String>,
    pub value: f64,
}

/// A named metric with a help string, a fixed ordered label set and a
/// sequence of samples. Families are built fresh on every collector
/// invocation and discarded after rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub label_names: Vec<String>,
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    pub fn gauge<S: Into<String>>(name: S, help: S, label_names: Vec<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            kind: MetricKind::Gauge,
            label_names,
            samples: Vec::new(),
        }
    }

    /// Append a sample. The value tuple must line up with the family's
    /// label names; construction sites keep this positional invariant.
    pub fn sample(&mut self, label_values: Vec<String>, value: f64) {
        debug_assert_eq!(label_values.len(), self.label_names.len());
        self.samples.push(Sample {
            label_values,
            value,
        });
    }

    /// Render this family as one exposition-format stanza.
    pub fn render(&self, out: &mut String) {
        let _ = writeln!(out, "# HELP {} {}", self.name, self.help);
        let _ = writeln!(out, "# TYPE {} {}", self.name, self.kind.as_str());

        for sample in &self.samples {
            out.push_str(&self.name);
            if !self.label_names.is_empty() {
                out.push('{');
                for (i, (name, value)) in self
                    .label_names
                    .iter()
                    .zip(&sample.label_values)
                    .enumerate()
                {
                    if i > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "{}=\"{}\"", name, escape_label_value(value));
                }
                out.push('}');
            }
            out.push(' ');
            out.push_str(&format_value(sample.value));
            out.push('\n');
        }
    }
}

/// Render a full scrape result into exposition-format text.
pub fn render_families(families: &[MetricFamily]) -> String {
    let mut out = String::new();
    for family in families {
        family.render(&mut out);
    }
    out
}

/// Coerce a loosely typed API value into label-string form. All
/// collectors funnel label construction through here so floats,
/// integers and booleans format consistently.
pub fn label_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => {
            if *b {
                "1".to_string()
            } else {
                "0".to_string()
            }
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                format_value(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Escape a label value: backslash, double-quote and newline.
fn escape_label_value(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}

/// Format a metric value. Integral values render without a decimal
/// point, everything else with enough precision to round-trip.
fn format_value(v: f64) -> String {
    if v.is_infinite() {
        return if v.is_sign_positive() {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        };
    }
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v == v.floor() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_labeled_sample() {
        let mut family = MetricFamily::gauge(
            "name",
            "Some help.",
            vec!["a".to_string(), "b".to_string()],
        );
        family.sample(vec!["x".to_string(), "y".to_string()], 3.5);

        let out = render_families(&[family]);
        assert_eq!(
            out,
            "# HELP name Some help.\n# TYPE name gauge\nname{a=\"x\",b=\"y\"} 3.5\n"
        );
    }

    #[test]
    fn test_render_unlabeled_sample() {
        let mut family = MetricFamily::gauge("count", "Help.", vec![]);
        family.sample(vec![], 4.0);

        let mut out = String::new();
        family.render(&mut out);
        assert!(out.contains("count 4\n"));
    }

    #[test]
    fn test_render_empty_family_keeps_stanza() {
        let family = MetricFamily::gauge("empty", "Help.", vec!["id".to_string()]);
        let mut out = String::new();
        family.render(&mut out);
        assert_eq!(out, "# HELP empty Help.\n# TYPE empty gauge\n");
    }

    #[test]
    fn test_escape_label_value() {
        assert_eq!(escape_label_value("plain"), "plain");
        assert_eq!(escape_label_value("a\\b"), "a\\\\b");
        assert_eq!(escape_label_value("a\"b"), "a\\\"b");
        assert_eq!(escape_label_value("a\nb"), "a\\nb");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(42.0), "42");
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(3.125), "3.125");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
        assert_eq!(format_value(f64::NAN), "NaN");
    }

    #[test]
    fn test_label_value_coercion() {
        assert_eq!(label_value(&json!("host")), "host");
        assert_eq!(label_value(&json!(true)), "1");
        assert_eq!(label_value(&json!(false)), "0");
        assert_eq!(label_value(&json!(7)), "7");
        assert_eq!(label_value(&json!(2.5)), "2.5");
        assert_eq!(label_value(&Value::Null), "");
    }
}
