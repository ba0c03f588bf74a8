use std::sync::OnceLock;

use ash::vk;

use crate::commands::command_buffer::GfxCommandBuffer;
use crate::commands::command_queue::GfxCommandQueue;
use crate::commands::fence::GfxFence;
use crate::commands::submit_info::GfxSubmitInfo;
use crate::foundation::debug_messenger::GfxDebugMsger;
use crate::foundation::device::GfxDevice;
use crate::foundation::instance::GfxInstance;
use crate::foundation::physical_device::GfxPhysicalDevice;

static GFX: OnceLock<Gfx> = OnceLock::new();

/// 全局唯一的 Gfx 上下文
///
/// 持有 instance、device、queue、allocator 以及 command pool。
/// 所有 GfxXxx 封装类型都通过 `Gfx::get()` 访问这里的句柄。
///
/// 初始化失败直接 panic：设备层对象创建失败时渲染器无法继续。
pub struct Gfx {
    pub vk_entry: ash::Entry,
    pub instance: GfxInstance,
    _debug_msger: Option<GfxDebugMsger>,
    pub physical_device: GfxPhysicalDevice,
    gfx_device: GfxDevice,
    pub vm_allocator: vk_mem::Allocator,
    graphics_queue: GfxCommandQueue,
    command_pool: vk::CommandPool,
}

// new & init
impl Gfx {
    /// 创建全局 Gfx 上下文，应在创建任何 GfxXxx 对象之前调用一次
    pub fn init(raw_display_handle: raw_window_handle::RawDisplayHandle, app_name: &str) {
        let _span = tracy_client::span!("Gfx::init");

        let gfx = Self::new(raw_display_handle, app_name);
        if GFX.set(gfx).is_err() {
            panic!("Gfx::init called twice");
        }
    }

    #[inline]
    pub fn get() -> &'static Gfx {
        GFX.get().expect("Gfx is not initialized, call Gfx::init first")
    }

    fn new(raw_display_handle: raw_window_handle::RawDisplayHandle, app_name: &str) -> Self {
        let vk_entry = unsafe { ash::Entry::load().expect("failed to load vulkan entry") };

        let instance = GfxInstance::new(&vk_entry, raw_display_handle, app_name);
        let debug_msger =
            instance.validation_enabled.then(|| GfxDebugMsger::new(&vk_entry, &instance.ash_instance));

        let physical_device = GfxPhysicalDevice::new(&instance.ash_instance);

        let queue_priorities = [1.0_f32];
        let queue_ci = vk::DeviceQueueCreateInfo::default()
            .queue_family_index(physical_device.graphics_queue_family)
            .queue_priorities(&queue_priorities);
        let gfx_device = GfxDevice::new(
            &instance.ash_instance,
            physical_device.vk_handle,
            std::slice::from_ref(&queue_ci),
            instance.validation_enabled,
        );

        let vm_allocator = unsafe {
            vk_mem::Allocator::new(vk_mem::AllocatorCreateInfo::new(
                &instance.ash_instance,
                &gfx_device,
                physical_device.vk_handle,
            ))
            .expect("failed to create vma allocator")
        };

        let graphics_queue = GfxCommandQueue::new(&gfx_device, physical_device.graphics_queue_family, 0);

        let pool_ci = vk::CommandPoolCreateInfo::default()
            .queue_family_index(physical_device.graphics_queue_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        let command_pool = unsafe { gfx_device.create_command_pool(&pool_ci, None).unwrap() };

        Self {
            vk_entry,
            instance,
            _debug_msger: debug_msger,
            physical_device,
            gfx_device,
            vm_allocator,
            graphics_queue,
            command_pool,
        }
    }
}

// getters
impl Gfx {
    #[inline]
    pub fn gfx_device(&self) -> &GfxDevice {
        &self.gfx_device
    }
    #[inline]
    pub fn allocator(&self) -> &vk_mem::Allocator {
        &self.vm_allocator
    }
    #[inline]
    pub fn gfx_queue(&self) -> &GfxCommandQueue {
        &self.graphics_queue
    }
    #[inline]
    pub fn command_pool(&self) -> vk::CommandPool {
        self.command_pool
    }
}

// tools
impl Gfx {
    /// 分配一个 primary command buffer
    pub fn alloc_command_buffer(&self, name: impl AsRef<str>) -> GfxCommandBuffer {
        GfxCommandBuffer::new(self.command_pool, name)
    }

    /// 录制并立即提交一段一次性命令，阻塞直到执行完成
    pub fn one_time_exec<R>(&self, record: impl FnOnce(&GfxCommandBuffer) -> R, name: impl AsRef<str>) -> R {
        let cmd = self.alloc_command_buffer(format!("one-time-{}", name.as_ref()));
        cmd.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        let result = record(&cmd);
        cmd.end();

        let fence = GfxFence::new(false, name.as_ref());
        if let Err(e) = self.graphics_queue.submit(vec![GfxSubmitInfo::new(std::slice::from_ref(&cmd))], Some(&fence))
        {
            // one-time 命令属于初始化路径，提交失败无法继续
            panic!("one_time_exec submit failed: {:?}", e);
        }
        fence.wait();
        fence.destroy();
        cmd.free();

        result
    }

    #[inline]
    pub fn wait_idle(&self) {
        self.gfx_device.wait_idle();
    }

    /// 退出前调用：等待 GPU 空闲并释放 command pool。
    /// instance / device / allocator 随进程退出回收。
    pub fn shutdown(&self) {
        self.wait_idle();
        unsafe {
            self.gfx_device.destroy_command_pool(self.command_pool, None);
        }
        log::info!("gfx shutdown complete");
    }
}
