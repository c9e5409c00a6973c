// ============================================================
// Layer 5 - Backend Selection
// ============================================================
// Training always runs on an autodiff backend. CPU work uses
// NdArray; `--gpu N` switches to WGPU on discrete adapter N.
// Evaluation calls `valid()` on the model, which drops it to
// the inner backend (NdArray or Wgpu) with no gradient tape.

use burn::backend::{
    ndarray::NdArrayDevice,
    wgpu::WgpuDevice,
    Autodiff, NdArray, Wgpu,
};

pub type CpuBackend = Autodiff<NdArray<f32>>;
pub type GpuBackend = Autodiff<Wgpu>;

/// Compute device picked once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceSpec {
    Cpu,
    Gpu(usize),
}

impl DeviceSpec {
    pub fn from_index(gpu: Option<usize>) -> Self {
        gpu.map_or(DeviceSpec::Cpu, DeviceSpec::Gpu)
    }

    pub fn cpu_device() -> NdArrayDevice {
        NdArrayDevice::Cpu
    }

    pub fn gpu_device(index: usize) -> WgpuDevice {
        WgpuDevice::DiscreteGpu(index)
    }
}

impl std::fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceSpec::Cpu => write!(f, "cpu (ndarray)"),
            DeviceSpec::Gpu(i) => write!(f, "gpu {i} (wgpu)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_from_flag() {
        assert_eq!(DeviceSpec::from_index(None), DeviceSpec::Cpu);
        assert_eq!(DeviceSpec::from_index(Some(1)), DeviceSpec::Gpu(1));
        assert_eq!(DeviceSpec::Gpu(0).to_string(), "gpu 0 (wgpu)");
    }
}
