pub mod container_gateway;
pub mod docker_client;
pub mod render_sink;
