use ash::vk;
use itertools::Itertools;

use crate::commands::fence::GfxFence;
use crate::commands::submit_info::GfxSubmitInfo;
use crate::foundation::device::GfxDevice;
use crate::gfx::Gfx;

/// graphics queue 封装
///
/// 所有提交都走 synchronization2 的 `queue_submit2`。
/// submit 返回 `VkResult`，由调用方决定 log-and-continue 还是终止。
pub struct GfxCommandQueue {
    queue: vk::Queue,
    queue_family: u32,
}

// new & init
impl GfxCommandQueue {
    pub fn new(gfx_device: &GfxDevice, queue_family: u32, queue_index: u32) -> Self {
        let queue = unsafe { gfx_device.get_device_queue(queue_family, queue_index) };
        Self { queue, queue_family }
    }
}

// getters
impl GfxCommandQueue {
    #[inline]
    pub fn handle(&self) -> vk::Queue {
        self.queue
    }
    #[inline]
    pub fn queue_family(&self) -> u32 {
        self.queue_family
    }
}

// tools
impl GfxCommandQueue {
    /// 提交一批命令。每帧的提交失败属于 log-and-continue 类错误，
    /// 因此这里返回状态码而不是直接 panic。
    pub fn submit(&self, infos: Vec<GfxSubmitInfo>, fence: Option<&GfxFence>) -> ash::prelude::VkResult<()> {
        let submit_infos = infos.iter().map(|info| info.submit_info()).collect_vec();
        unsafe {
            Gfx::get().gfx_device().queue_submit2(
                self.queue,
                &submit_infos,
                fence.map_or(vk::Fence::null(), |f| f.handle()),
            )
        }
    }

    /// 阻塞直到该 queue 上的所有工作完成
    #[inline]
    pub fn wait_idle(&self) {
        unsafe {
            Gfx::get().gfx_device().queue_wait_idle(self.queue).unwrap();
        }
    }
}
