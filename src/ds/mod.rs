pub mod avl;
pub mod key;

pub use avl::{AvlTree, InOrderIter, RevOrderIter};
pub use key::SortField;
