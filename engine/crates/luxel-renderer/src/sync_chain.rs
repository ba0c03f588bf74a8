use luxel_gfx::commands::semaphore::GfxSemaphore;

/// 跨提交的同步链：四个 binary semaphore
///
/// raster_complete 在当前协议中创建但不被等待，保留以兼容旧的提交协议
pub struct SyncChain {
    pub surface_acquired: GfxSemaphore,
    pub shading_complete: GfxSemaphore,
    pub render_complete: GfxSemaphore,
    pub raster_complete: GfxSemaphore,
}

// new & init
impl SyncChain {
    pub fn new() -> Self {
        Self {
            surface_acquired: GfxSemaphore::new("surface-acquired"),
            shading_complete: GfxSemaphore::new("shading-complete"),
            render_complete: GfxSemaphore::new("render-complete"),
            raster_complete: GfxSemaphore::new("raster-complete"),
        }
    }
}

impl Default for SyncChain {
    fn default() -> Self {
        Self::new()
    }
}

// destroy
impl SyncChain {
    pub fn destroy(self) {
        self.surface_acquired.destroy();
        self.shading_complete.destroy();
        self.render_complete.destroy();
        self.raster_complete.destroy();
    }
}
