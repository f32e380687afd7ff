pub mod mysql;
pub mod pocketbase;
