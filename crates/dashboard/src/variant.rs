//! Page variant configuration.
//!
//! The task page used to exist in several near-identical copies that
//! differed only in a handful of behaviours. [`PageVariant`] captures those
//! differences so one controller serves them all.

use std::str::FromStr;

use serde::Serialize;

/// How user-facing notices are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeStyle {
    /// Blocking dialog.
    Alert,
    /// Transient notification.
    Toast,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageVariant {
    /// Call the calculate-amount endpoint after every subtask mutation.
    pub recalculate_amount: bool,
    /// Offer the `loops` subtask type.
    pub allow_loops_type: bool,
    pub notice_style: NoticeStyle,
    /// Consume realtime events. When false only polling and explicit
    /// refreshes update the page.
    pub realtime: bool,
}

impl PageVariant {
    /// Alert dialogs, no realtime, no amount recalculation.
    pub fn classic() -> Self {
        Self {
            recalculate_amount: false,
            allow_loops_type: false,
            notice_style: NoticeStyle::Alert,
            realtime: false,
        }
    }

    /// Toasts, realtime updates, server-side amount recalculation.
    pub fn realtime() -> Self {
        Self {
            recalculate_amount: true,
            allow_loops_type: false,
            notice_style: NoticeStyle::Toast,
            realtime: true,
        }
    }

    /// Realtime variant that also offers the `loops` subtask type.
    pub fn loops() -> Self {
        Self {
            allow_loops_type: true,
            ..Self::realtime()
        }
    }
}

impl Default for PageVariant {
    fn default() -> Self {
        Self::realtime()
    }
}

impl FromStr for PageVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(Self::classic()),
            "realtime" => Ok(Self::realtime()),
            "loops" => Ok(Self::loops()),
            other => Err(format!(
                "Unknown page variant '{other}'. Must be one of: classic, realtime, loops"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_parse_by_name() {
        assert_eq!("Classic".parse::<PageVariant>().unwrap(), PageVariant::classic());
        assert!("loops".parse::<PageVariant>().unwrap().allow_loops_type);
        assert!("v7".parse::<PageVariant>().is_err());
    }

    #[test]
    fn default_is_realtime() {
        let v = PageVariant::default();
        assert!(v.realtime);
        assert!(v.recalculate_amount);
        assert_eq!(v.notice_style, NoticeStyle::Toast);
    }
}
