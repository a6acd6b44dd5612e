pub mod lattice_points;
pub mod partitions;
pub mod permutations;
