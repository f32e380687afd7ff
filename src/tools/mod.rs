pub mod mysql;
pub mod pocketbase;
pub mod registry;
