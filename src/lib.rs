pub mod cursor;
pub mod db;
pub mod error;
pub mod iterator;
pub mod memdb;
pub mod remote;

pub mod pb {
    include!(concat!(env!("OUT_DIR"), "/rangekvpb.rs"));
}
