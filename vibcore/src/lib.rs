// data module
pub mod data {
    pub mod spectrum;
}

// algorithm module
pub mod algorithm {
    pub mod baseline;
    pub mod calibration;
    pub mod region;
    pub mod transform;
    pub mod utility;
}

// collaborator interfaces (loading, persistence, interactive picking, rendering)
pub mod io {
    pub mod interface;
}

pub mod error;
