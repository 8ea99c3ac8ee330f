//! Operators. Each one is a concrete
//! [`Observable`](crate::observable::Observable) type created through the
//! matching method on [`ObservableExt`](crate::observable::ObservableExt).

pub mod buffer_when;
pub mod catch_error;
pub mod combine_latest;
pub mod debounce;
pub mod filter;
pub mod map;
pub mod merge;
pub mod partition;
pub mod share_replay;
pub mod start_with;
pub mod switch_map;
pub mod take;
pub mod take_until;
pub mod tap;
pub mod to_array;
