pub mod livestock_repo;
pub use livestock_repo::LivestockRepository;
