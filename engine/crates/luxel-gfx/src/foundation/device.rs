use std::ffi::{CStr, CString};
use std::ops::Deref;

use ash::vk;
use itertools::Itertools;

use crate::foundation::debug_messenger::DebugType;

/// Vulkan 逻辑设备封装
///
/// 包含核心设备 API 以及扩展的函数指针（交换链、调试工具）。
/// 这些函数指针在应用生命周期中保持不变，可以安全共享。
pub struct GfxDevice {
    /// 核心 Vulkan 设备 API
    pub(crate) device: ash::Device,
    /// 交换链扩展 API
    pub(crate) swapchain: ash::khr::swapchain::Device,
    /// 调试工具扩展 API，校验层不可用时为 None
    pub(crate) debug_utils: Option<ash::ext::debug_utils::Device>,
}

// 构造与销毁
impl GfxDevice {
    pub fn new(
        instance: &ash::Instance,
        pdevice: vk::PhysicalDevice,
        queue_create_info: &[vk::DeviceQueueCreateInfo],
        with_debug_utils: bool,
    ) -> Self {
        let _span = tracy_client::span!("GfxDevice::new");

        let device_exts = Self::basic_device_exts().iter().map(|e| e.as_ptr()).collect_vec();
        let mut exts_str = String::new();
        for ext in &device_exts {
            exts_str.push_str(&format!("\n\t{:?}", unsafe { CStr::from_ptr(*ext) }));
        }
        log::info!("device exts: {}", exts_str);

        let mut sync2_feature = vk::PhysicalDeviceSynchronization2Features::default().synchronization2(true);
        let basic_features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(true);
        let mut all_features =
            vk::PhysicalDeviceFeatures2::default().features(basic_features).push_next(&mut sync2_feature);

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(queue_create_info)
            .enabled_extension_names(&device_exts)
            .push_next(&mut all_features);

        let device = unsafe { instance.create_device(pdevice, &device_create_info, None).unwrap() };

        let vk_swapchain = ash::khr::swapchain::Device::new(instance, &device);
        let vk_debug_utils = with_debug_utils.then(|| ash::ext::debug_utils::Device::new(instance, &device));

        Self {
            device,
            swapchain: vk_swapchain,
            debug_utils: vk_debug_utils,
        }
    }

    pub fn destroy(&self) {
        log::info!("destroying device");
        unsafe {
            self.device.destroy_device(None);
        }
    }
}

// 创建过程的辅助函数
impl GfxDevice {
    /// 必要的 device extensions
    fn basic_device_exts() -> Vec<&'static CStr> {
        vec![ash::khr::swapchain::NAME]
    }
}

// getters
impl GfxDevice {
    #[inline]
    pub fn vk_handle(&self) -> vk::Device {
        self.device.handle()
    }
    #[inline]
    pub fn swapchain(&self) -> &ash::khr::swapchain::Device {
        &self.swapchain
    }
}

// tools
impl GfxDevice {
    #[inline]
    pub fn set_object_debug_name<T: vk::Handle + Copy>(&self, handle: T, name: impl AsRef<str>) {
        let Some(debug_utils) = &self.debug_utils else {
            return;
        };
        let name = CString::new(name.as_ref()).unwrap();
        unsafe {
            debug_utils
                .set_debug_utils_object_name(
                    &vk::DebugUtilsObjectNameInfoEXT::default().object_name(name.as_c_str()).object_handle(handle),
                )
                .unwrap();
        }
    }

    pub fn set_debug_name<T: DebugType>(&self, handle: &T, name: impl AsRef<str>) {
        let Some(debug_utils) = &self.debug_utils else {
            return;
        };
        let debug_name = format!("{}::{}", T::debug_type_name(), name.as_ref());
        let debug_name = CString::new(debug_name.as_str()).unwrap();
        unsafe {
            debug_utils
                .set_debug_utils_object_name(
                    &vk::DebugUtilsObjectNameInfoEXT::default()
                        .object_name(debug_name.as_c_str())
                        .object_handle(handle.vk_handle()),
                )
                .unwrap();
        }
    }

    #[inline]
    pub fn wait_idle(&self) {
        unsafe {
            self.device.device_wait_idle().unwrap();
        }
    }
}

impl Deref for GfxDevice {
    type Target = ash::Device;
    fn deref(&self) -> &Self::Target {
        &self.device
    }
}
