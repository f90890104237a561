mod hash_map_list;
mod id;

pub use hash_map_list::HashMapList;
pub use id::IdGenerator;
