//! Closed vocabularies used by tasks and subtasks.
//!
//! Every tag serializes to the exact string the server stores and parses
//! back from the same string (used by the CLI value parsers).

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
                    .ok_or_else(|| {
                        let valid: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        $crate::error::CoreError::Validation(format!(
                            "Invalid {} '{}'. Must be one of: {:?}",
                            $label, s, valid
                        ))
                    })
            }
        }
    };
}

pub(crate) use wire_enum;

wire_enum! {
    /// How a task's required amount is measured.
    TaskType, "task type" {
        Events => "events",
        Hours => "hours",
    }
}

wire_enum! {
    /// A subtask's single type tag. `loops` is only offered by some page
    /// variants.
    SubtaskType, "subtask type" {
        Events => "events",
        Hours => "hours",
        Loops => "loops",
    }
}

wire_enum! {
    DayTime, "day time" {
        Day => "day",
        Night => "night",
        Dusk => "dusk",
        Dawn => "dawn",
    }
}

wire_enum! {
    Weather, "weather" {
        Clear => "Clear",
        Fog => "Fog",
        Overcast => "Overcast",
        Rain => "Rain",
        Snow => "Snow",
        Mixed => "Mixed",
    }
}

wire_enum! {
    Scene, "scene" {
        Highway => "Highway",
        Urban => "Urban",
        Rural => "Rural",
        SubUrban => "Sub-Urban",
        TestTrack => "Test Track",
        Mixed => "Mixed",
    }
}
