macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Get the inner u32 value.
            pub fn inner(self) -> u32 {
                self.0
            }

            /// Create an ID from a u32 value.
            pub fn new(value: u32) -> Self {
                Self(value)
            }

            /// The ID as a zero-based position.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id_type!(VariableId);
define_id_type!(ConstraintId);

#[cfg(test)]
mod tests {
    use super::{ConstraintId, VariableId};

    #[test]
    fn ids_order_by_assignment() {
        let first = VariableId::new(3);
        let second = VariableId::new(4);
        assert!(first < second);
        assert_eq!(second.index(), 4);
    }

    #[test]
    fn constraint_id_exposes_inner() {
        assert_eq!(ConstraintId::new(11).inner(), 11);
    }
}
