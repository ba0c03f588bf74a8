use ash::vk;
use std::ptr;

use vk_mem::Alloc;

use crate::{foundation::debug_messenger::DebugType, gfx::Gfx};

pub struct GfxBuffer {
    handle: vk::Buffer,
    allocation: vk_mem::Allocation,

    size: vk::DeviceSize,

    /// 在初始化阶段写死
    map_ptr: Option<*mut u8>,

    debug_name: String,

    _usage: vk::BufferUsageFlags,
}
impl DebugType for GfxBuffer {
    fn debug_type_name() -> &'static str {
        "GfxBuffer"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
impl Drop for GfxBuffer {
    fn drop(&mut self) {
        let allocator = Gfx::get().allocator();
        unsafe {
            if self.map_ptr.is_some() {
                allocator.unmap_memory(&mut self.allocation);
            }

            allocator.destroy_buffer(self.handle, &mut self.allocation);
        }
    }
}
// init & destroy
impl GfxBuffer {
    /// - mem_map: 创建时就持久映射，之后通过 `transfer_data_by_mmap` 写入
    /// - 优先使用 device memory
    pub fn new(
        buffer_size: vk::DeviceSize,
        buffer_usage: vk::BufferUsageFlags,
        mem_map: bool,
        name: impl AsRef<str>,
    ) -> Self {
        let buffer_ci = vk::BufferCreateInfo::default().size(buffer_size).usage(buffer_usage);
        let alloc_ci = vk_mem::AllocationCreateInfo {
            usage: vk_mem::MemoryUsage::AutoPreferDevice,
            flags: if mem_map {
                vk_mem::AllocationCreateFlags::HOST_ACCESS_RANDOM
            } else {
                vk_mem::AllocationCreateFlags::empty()
            },
            ..Default::default()
        };

        let (buffer, mut alloc) = unsafe { Gfx::get().vm_allocator.create_buffer(&buffer_ci, &alloc_ci).unwrap() };

        let mut mapped_ptr = None;
        if mem_map {
            unsafe {
                let allocator = Gfx::get().allocator();
                mapped_ptr = Some(allocator.map_memory(&mut alloc).unwrap());
            }
        }

        Gfx::get().gfx_device().set_object_debug_name(buffer, format!("Buffer::{}", name.as_ref()));
        Self {
            handle: buffer,
            allocation: alloc,
            size: buffer_size,
            map_ptr: mapped_ptr,

            debug_name: name.as_ref().to_string(),

            _usage: buffer_usage,
        }
    }

    #[inline]
    pub fn new_stage_buffer(size: vk::DeviceSize, debug_name: impl AsRef<str>) -> Self {
        Self::new(size, vk::BufferUsageFlags::TRANSFER_SRC, true, debug_name)
    }

    /// host 可见的 uniform buffer，每帧直接 mmap 写入
    #[inline]
    pub fn new_uniform_buffer(size: vk::DeviceSize, debug_name: impl AsRef<str>) -> Self {
        Self::new(size, vk::BufferUsageFlags::UNIFORM_BUFFER, true, debug_name)
    }

    #[inline]
    pub fn destroy(self) {
        drop(self)
    }
}
// getter
impl GfxBuffer {
    #[inline]
    pub fn vk_buffer(&self) -> vk::Buffer {
        self.handle
    }

    #[inline]
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }
}
// tools
impl GfxBuffer {
    #[inline]
    pub fn mapped_ptr(&self) -> *mut u8 {
        self.map_ptr.expect("Buffer is not mapped, create it with mem_map = true")
    }

    /// 通过 mem map 的方式将 data 传入到 buffer 中
    pub fn transfer_data_by_mmap<T>(&self, data: &[T])
    where
        T: Sized + Copy,
    {
        unsafe {
            ptr::copy_nonoverlapping(data.as_ptr() as *const u8, self.mapped_ptr(), size_of_val(data));

            let allocator = Gfx::get().allocator();
            allocator.flush_allocation(&self.allocation, 0, size_of_val(data) as vk::DeviceSize).unwrap();
        }
    }

    /// 创建一个临时的 stage buffer，先将数据放入 stage buffer，再 transfer 到
    /// self；同步等待传输完成
    ///
    /// # Note
    /// * 用于传输大块的 device local 数据，小块数据直接 mmap
    pub fn transfer_data_sync(&self, data: &[impl Sized + Copy]) {
        let stage_buffer =
            Self::new_stage_buffer(size_of_val(data) as vk::DeviceSize, format!("{}-stage-buffer", self.debug_name));

        stage_buffer.transfer_data_by_mmap(data);

        let cmd_name = format!("{}-transfer-data", &self.debug_name);
        Gfx::get().one_time_exec(
            |cmd| {
                cmd.cmd_copy_buffer(
                    &stage_buffer,
                    self,
                    &[vk::BufferCopy {
                        size: size_of_val(data) as vk::DeviceSize,
                        ..Default::default()
                    }],
                );
            },
            &cmd_name,
        );
    }
}
