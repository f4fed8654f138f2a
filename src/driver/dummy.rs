pub mod dummy_transport;
