//! Checks an editor applies before a configuration is saved or sent.
//!
//! None of these stop the codec or the compiler from working; they are reported so a person can
//! fix the setup.

use std::fmt;

use crate::Configuration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// Keyword text outside of the allowed set.
    UnknownKeyword { value: String },
    /// Text that should be a number but does not read as one.
    NotNumeric { value: String },
    /// Channel numbers start at 1.
    ZeroChannel,
    DuplicateChannel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Human-readable location, e.g. `channel 2 scale` or `trigger mode`.
    pub field: String,
    pub kind: IssueKind,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            IssueKind::UnknownKeyword { value } =>
                write!(f, "{}: unknown value {:?}", self.field, value),
            IssueKind::NotNumeric { value } =>
                write!(f, "{}: {:?} is not a number", self.field, value),
            IssueKind::ZeroChannel =>
                write!(f, "{}: channel numbers start at 1", self.field),
            IssueKind::DuplicateChannel =>
                write!(f, "{}: defined more than once", self.field),
        }
    }
}

fn check_numeric(issues: &mut Vec<Issue>, field: impl FnOnce() -> String, value: &str) {
    let value = value.trim();
    if !value.is_empty() && value.parse::<f64>().is_err() {
        issues.push(Issue { field: field(), kind: IssueKind::NotNumeric { value: value.to_owned() } });
    }
}

fn check_keyword(issues: &mut Vec<Issue>, field: impl FnOnce() -> String, known: bool, value: &str) {
    if !known {
        issues.push(Issue { field: field(), kind: IssueKind::UnknownKeyword { value: value.to_owned() } });
    }
}

impl Configuration {
    /// Find settings an instrument would reject or misread.
    pub fn issues(&self) -> Vec<Issue> {
        let mut issues = Vec::new();

        check_numeric(&mut issues, || "time scale".to_owned(), &self.time_scale);

        for (index, channel) in self.channels.iter().enumerate() {
            let n = channel.number;
            if n == 0 {
                issues.push(Issue { field: format!("channel #{}", index + 1), kind: IssueKind::ZeroChannel });
            }
            if self.channels[..index].iter().any(|other| other.number == n) {
                issues.push(Issue { field: format!("channel {}", n), kind: IssueKind::DuplicateChannel });
            }
            // hidden channels are not sent, so their settings cannot be wrong yet
            if !channel.display { continue }
            check_numeric(&mut issues, || format!("channel {} scale", n), &channel.scale);
            check_numeric(&mut issues, || format!("channel {} probe", n), &channel.probe);
            check_keyword(&mut issues, || format!("channel {} unit", n),
                channel.unit.is_known(), channel.unit.as_str());
        }

        let trigger = &self.trigger;
        check_keyword(&mut issues, || "trigger mode".to_owned(),
            trigger.mode.is_known(), trigger.mode.as_str());
        check_keyword(&mut issues, || "trigger source".to_owned(),
            trigger.source.is_known(), trigger.source.as_str());
        check_numeric(&mut issues, || "trigger level".to_owned(), &trigger.level);
        check_keyword(&mut issues, || "trigger slope".to_owned(),
            trigger.slope.is_known(), trigger.slope.as_str());

        issues
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Channel, Slope, TriggerMode, TriggerSource, Unit};

    #[test]
    fn test_defaults_are_clean() {
        assert!(Configuration::default().issues().is_empty());
    }

    #[test]
    fn test_numeric_fields() {
        let mut config = Configuration::default();
        config.time_scale = "50ms".to_owned();
        config.channels[0].display = true;
        config.channels[0].scale = "1e-3".to_owned();
        config.channels[0].probe = "x10".to_owned();
        config.trigger.level = "-0.25".to_owned();
        let issues = config.issues();
        assert_eq!(issues, [
            Issue { field: "time scale".to_owned(),
                    kind: IssueKind::NotNumeric { value: "50ms".to_owned() } },
            Issue { field: "channel 1 probe".to_owned(),
                    kind: IssueKind::NotNumeric { value: "x10".to_owned() } },
        ]);
        assert_eq!(issues[1].to_string(), "channel 1 probe: \"x10\" is not a number");
    }

    #[test]
    fn test_hidden_channel_not_checked() {
        let mut config = Configuration::default();
        config.channels[3].scale = "bogus".to_owned();
        config.channels[3].unit = Unit::Other("OHM".to_owned());
        assert!(config.issues().is_empty());
    }

    #[test]
    fn test_unknown_keywords() {
        let mut config = Configuration::default();
        config.channels[1].display = true;
        config.channels[1].unit = Unit::Other("OHM".to_owned());
        config.trigger.mode = TriggerMode::Other("TV".to_owned());
        config.trigger.source = TriggerSource::Other("CHAN9".to_owned());
        config.trigger.slope = Slope::Other("EITHER".to_owned());
        let fields = config.issues().into_iter().map(|issue| issue.field).collect::<Vec<_>>();
        assert_eq!(fields, ["channel 2 unit", "trigger mode", "trigger source", "trigger slope"]);
    }

    #[test]
    fn test_channel_numbers() {
        let mut config = Configuration::default();
        config.channels.push(Channel::new(2));
        config.channels.push(Channel::new(0));
        let kinds = config.issues().into_iter().map(|issue| issue.kind).collect::<Vec<_>>();
        assert_eq!(kinds, [IssueKind::DuplicateChannel, IssueKind::ZeroChannel]);
    }
}
