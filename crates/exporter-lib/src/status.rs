//! Status normalization
//!
//! The manager API reports object state as free-form strings whose case is not
//! consistent between endpoints. Each family declares a fixed vocabulary and
//! every observed status is turned into a one-hot vector over it: exactly one
//! entry is 1.0 when the observed string matches a member (case-insensitively),
//! and every entry is 0.0 when it matches nothing.
//!
//! An unrecognized status is not an error. It cannot be told apart from "the
//! object is in none of the known states", so it is exported as all zeros.

/// Map `observed` onto the ordered vocabulary `possible`.
///
/// The result holds every vocabulary member, in vocabulary order, paired with
/// 1.0 on a case-insensitive match and 0.0 otherwise.
pub fn normalize<'a>(possible: &[&'a str], observed: &str) -> Vec<(&'a str, f64)> {
    let observed = observed.to_uppercase();
    possible
        .iter()
        .map(|candidate| {
            let value = if candidate.to_uppercase() == observed {
                1.0
            } else {
                0.0
            };
            (*candidate, value)
        })
        .collect()
}

/// A closed set of states an object family can report.
///
/// Implement with [`status_vocabulary!`](crate::status_vocabulary) so the
/// string mapping is an exhaustive match.
pub trait StatusVocabulary: Copy + Eq + Send + Sync + 'static {
    /// Every member, in export order.
    const ALL: &'static [Self];

    /// Wire representation of this member.
    fn as_str(self) -> &'static str;

    /// Parse an observed status, ignoring case.
    fn parse(observed: &str) -> Option<Self> {
        let observed = observed.to_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|member| member.as_str().to_uppercase() == observed)
    }

    /// One-hot encoding of `observed` over [`Self::ALL`].
    fn one_hot(observed: &str) -> Vec<(Self, f64)> {
        let matched = Self::parse(observed);
        Self::ALL
            .iter()
            .map(|member| {
                let value = if Some(*member) == matched { 1.0 } else { 0.0 };
                (*member, value)
            })
            .collect()
    }
}

/// Declare a status vocabulary enum.
///
/// ```
/// use exporter_lib::status::StatusVocabulary;
///
/// exporter_lib::status_vocabulary! {
///     pub enum LinkState {
///         Up => "UP",
///         Down => "DOWN",
///     }
/// }
///
/// assert_eq!(LinkState::parse("up"), Some(LinkState::Up));
/// ```
#[macro_export]
macro_rules! status_vocabulary {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::status::StatusVocabulary for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::status::StatusVocabulary::as_str(*self))
            }
        }
    };
}

status_vocabulary! {
    /// Operational status of a logical port
    pub enum PortStatus {
        Up => "UP",
        Down => "DOWN",
        Unknown => "UNKNOWN",
    }
}

status_vocabulary! {
    /// Realization state of a logical switch
    pub enum SwitchState {
        Pending => "PENDING",
        InProgress => "IN_PROGRESS",
        Success => "SUCCESS",
        Failed => "FAILED",
        PartialSuccess => "PARTIAL_SUCCESS",
        Orphaned => "ORPHANED",
        Unknown => "UNKNOWN",
    }
}

status_vocabulary! {
    /// Load balancer service status
    pub enum LoadBalancerStatus {
        Up => "UP",
        Down => "DOWN",
        Error => "ERROR",
        NoStandby => "NO_STANDBY",
        Detached => "DETACHED",
        Disabled => "DISABLED",
        Unknown => "UNKNOWN",
    }
}

status_vocabulary! {
    /// Load balancer pool status
    pub enum PoolStatus {
        Up => "UP",
        PartiallyUp => "PARTIALLY_UP",
        PrimaryDown => "PRIMARY_DOWN",
        Down => "DOWN",
        Detached => "DETACHED",
        Unknown => "UNKNOWN",
    }
}

status_vocabulary! {
    /// Load balancer pool member status
    pub enum PoolMemberStatus {
        Up => "UP",
        Down => "DOWN",
        Disabled => "DISABLED",
        GracefulDisabled => "GRACEFUL_DISABLED",
        Unused => "UNUSED",
    }
}

status_vocabulary! {
    /// DHCP server service status
    pub enum DhcpStatus {
        Up => "UP",
        Down => "DOWN",
        Error => "ERROR",
        NoStandby => "NO_STANDBY",
    }
}

status_vocabulary! {
    /// Transport node status
    pub enum TransportNodeState {
        Up => "UP",
        Down => "DOWN",
        Degraded => "DEGRADED",
        Unknown => "UNKNOWN",
    }
}

/// Case-insensitive comparison against a single sentinel such as `STABLE`,
/// `CONNECTED` or `running`.
pub fn matches_sentinel(observed: &str, sentinel: &str) -> bool {
    observed.to_uppercase() == sentinel.to_uppercase()
}
