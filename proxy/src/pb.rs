//! Generated gRPC message and service types for the supervised proxy's
//! `DeviceControl` service, compiled from `proto/devnet.proto` by
//! `tonic-build` in `build.rs`.

tonic::include_proto!("devnet.proxy.v1");
