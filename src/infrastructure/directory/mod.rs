mod inmemory;

pub use inmemory::InMemoryRoomDirectory;
