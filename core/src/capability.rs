use std::fmt;
use std::ops::BitOr;
use std::ops::BitOrAssign;

/// Bitset over the operations a backend supports. A deliberately small,
/// hand-rolled newtype rather than a dependency on the `bitflags` crate —
/// five flags do not earn a macro-generated implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackendCapability(u8);

impl BackendCapability {
    pub const NONE: BackendCapability = BackendCapability(0);
    pub const READ: BackendCapability = BackendCapability(1 << 0);
    pub const WRITE: BackendCapability = BackendCapability(1 << 1);
    pub const STREAM: BackendCapability = BackendCapability(1 << 2);
    pub const AUTH: BackendCapability = BackendCapability(1 << 3);
    pub const BATCH: BackendCapability = BackendCapability(1 << 4);

    pub const fn contains(self, other: BackendCapability) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for BackendCapability {
    type Output = BackendCapability;

    fn bitor(self, rhs: BackendCapability) -> BackendCapability {
        BackendCapability(self.0 | rhs.0)
    }
}

impl BitOrAssign for BackendCapability {
    fn bitor_assign(&mut self, rhs: BackendCapability) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for BackendCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (BackendCapability::READ, "READ"),
            (BackendCapability::WRITE, "WRITE"),
            (BackendCapability::STREAM, "STREAM"),
            (BackendCapability::AUTH, "AUTH"),
            (BackendCapability::BATCH, "BATCH"),
        ];
        let matched: Vec<&str> = names
            .into_iter()
            .filter(|(cap, _)| self.contains(*cap))
            .map(|(_, name)| name)
            .collect();
        write!(f, "{}", matched.join("|"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn combines_with_bitor() {
        let caps = BackendCapability::READ | BackendCapability::BATCH;
        assert!(caps.contains(BackendCapability::READ));
        assert!(caps.contains(BackendCapability::BATCH));
        assert!(!caps.contains(BackendCapability::WRITE));
    }

    #[test]
    fn displays_matched_names() {
        let caps = BackendCapability::READ | BackendCapability::BATCH;
        assert_eq!(caps.to_string(), "READ|BATCH");
    }
}
