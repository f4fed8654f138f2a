pub mod snapshot_dto;
