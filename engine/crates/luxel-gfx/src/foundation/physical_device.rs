use ash::vk;
use itertools::Itertools;

/// 物理设备封装
///
/// 记录选中的物理设备以及 graphics queue family 的 index。
/// 本渲染器所有提交都走同一个 graphics queue。
pub struct GfxPhysicalDevice {
    pub vk_handle: vk::PhysicalDevice,
    pub graphics_queue_family: u32,

    pub properties: vk::PhysicalDeviceProperties,
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
}
// new & init
impl GfxPhysicalDevice {
    pub fn new(instance: &ash::Instance) -> Self {
        let pdevices = unsafe { instance.enumerate_physical_devices().unwrap() };
        assert!(!pdevices.is_empty(), "no vulkan physical device found");

        // 优先独显，其次任意支持 graphics 的设备
        let (pdevice, queue_family) = pdevices
            .iter()
            .filter_map(|pdevice| Self::find_graphics_queue_family(instance, *pdevice).map(|f| (*pdevice, f)))
            .sorted_by_key(|(pdevice, _)| {
                let props = unsafe { instance.get_physical_device_properties(*pdevice) };
                match props.device_type {
                    vk::PhysicalDeviceType::DISCRETE_GPU => 0,
                    vk::PhysicalDeviceType::INTEGRATED_GPU => 1,
                    _ => 2,
                }
            })
            .next()
            .expect("no physical device with a graphics queue");

        let properties = unsafe { instance.get_physical_device_properties(pdevice) };
        let memory_properties = unsafe { instance.get_physical_device_memory_properties(pdevice) };

        log::info!(
            "physical device: {:?}, graphics queue family: {}",
            properties.device_name_as_c_str().unwrap_or(c"unknown"),
            queue_family
        );

        Self {
            vk_handle: pdevice,
            graphics_queue_family: queue_family,
            properties,
            memory_properties,
        }
    }

    fn find_graphics_queue_family(instance: &ash::Instance, pdevice: vk::PhysicalDevice) -> Option<u32> {
        let families = unsafe { instance.get_physical_device_queue_family_properties(pdevice) };
        families
            .iter()
            .position(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))
            .map(|idx| idx as u32)
    }
}
// getters
impl GfxPhysicalDevice {
    /// 查询 format 的硬件支持情况
    pub fn format_properties(&self, instance: &ash::Instance, format: vk::Format) -> vk::FormatProperties {
        unsafe { instance.get_physical_device_format_properties(self.vk_handle, format) }
    }
}
