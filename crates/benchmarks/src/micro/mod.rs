// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Built-in micro-benchmarks.

pub mod cuda_gemm;
pub mod gemm;
pub mod rocm_gemm;
pub mod tcp;
pub mod tensorrt;

pub use cuda_gemm::CudaGemmFlops;
pub use rocm_gemm::RocmGemmFlops;
pub use tcp::TcpConnectivity;
pub use tensorrt::TensorRtInference;
