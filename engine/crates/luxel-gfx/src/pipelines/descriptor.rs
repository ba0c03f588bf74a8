use ash::vk;

use crate::{foundation::debug_messenger::DebugType, gfx::Gfx};

/// 描述符集布局
///
/// # Destroy
/// 需要手动 destroy
pub struct GfxDescriptorSetLayout {
    handle: vk::DescriptorSetLayout,
}
impl DebugType for GfxDescriptorSetLayout {
    fn debug_type_name() -> &'static str {
        "GfxDescriptorSetLayout"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
impl GfxDescriptorSetLayout {
    pub fn new(bindings: &[vk::DescriptorSetLayoutBinding], name: impl AsRef<str>) -> Self {
        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(bindings);
        let gfx_device = Gfx::get().gfx_device();
        let handle = unsafe { gfx_device.create_descriptor_set_layout(&create_info, None).unwrap() };
        let layout = Self { handle };
        gfx_device.set_debug_name(&layout, name);
        layout
    }

    #[inline]
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.handle
    }

    pub fn destroy(self) {
        unsafe {
            Gfx::get().gfx_device().destroy_descriptor_set_layout(self.handle, None);
        }
    }
}

/// 描述符池
///
/// 一个池分配多个描述符集；set 跟随 pool 一起销毁
pub struct GfxDescriptorPool {
    handle: vk::DescriptorPool,
    name: String,
}
impl DebugType for GfxDescriptorPool {
    fn debug_type_name() -> &'static str {
        "GfxDescriptorPool"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
impl GfxDescriptorPool {
    pub fn new(max_sets: u32, pool_sizes: &[vk::DescriptorPoolSize], name: impl AsRef<str>) -> Self {
        let create_info = vk::DescriptorPoolCreateInfo::default().max_sets(max_sets).pool_sizes(pool_sizes);
        let gfx_device = Gfx::get().gfx_device();
        let handle = unsafe { gfx_device.create_descriptor_pool(&create_info, None).unwrap() };
        let pool = Self {
            handle,
            name: name.as_ref().to_string(),
        };
        gfx_device.set_debug_name(&pool, name);
        pool
    }

    #[inline]
    pub fn handle(&self) -> vk::DescriptorPool {
        self.handle
    }

    /// 分配一个描述符集，set 随 pool 销毁
    pub fn alloc_set(&self, layout: &GfxDescriptorSetLayout, name: impl AsRef<str>) -> vk::DescriptorSet {
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.handle)
            .set_layouts(std::slice::from_ref(&layout.handle));
        let gfx_device = Gfx::get().gfx_device();
        let set = unsafe { gfx_device.allocate_descriptor_sets(&alloc_info).unwrap()[0] };
        gfx_device.set_object_debug_name(set, name.as_ref());
        set
    }

    pub fn destroy(self) {
        log::info!("Destroying GfxDescriptorPool: {}", self.name);
        unsafe {
            Gfx::get().gfx_device().destroy_descriptor_pool(self.handle, None);
        }
    }
}
