use candle_core::Device;

/// Pick the accelerator compiled in, falling back to CPU.
pub fn select_device() -> Device {
    #[cfg(feature = "cuda")]
    {
        if let Ok(dev) = Device::new_cuda(0) { tracing::info!("embedding device: CUDA"); return dev; }
    }
    #[cfg(feature = "metal")]
    {
        if let Ok(dev) = Device::new_metal(0) { tracing::info!("embedding device: Metal (MPS)"); return dev; }
    }
    tracing::info!("embedding device: CPU");
    Device::Cpu
}
