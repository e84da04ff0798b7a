pub mod crypto;
pub mod currency;
pub mod debounce;
pub mod pagination;
pub mod permissions;
pub mod salary;
pub mod selection;
pub mod time;
pub mod validation;
