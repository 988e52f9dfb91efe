/// Index-based double-buffer role flag: the surface written in tick N is the
/// read source in tick N+1. Ownership of the surfaces themselves never
/// moves; only this index toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PingPong {
    current: usize,
}

impl PingPong {
    pub fn current(self) -> usize {
        self.current
    }

    pub fn next(self) -> usize {
        self.current ^ 1
    }

    pub fn swap(&mut self) {
        self.current ^= 1;
    }
}

pub const ACCUMULATION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// One offscreen accumulation target plus the bind group through which the
/// following tick samples it.
pub struct AccumulationSurface {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub bind_group: wgpu::BindGroup,
}

/// Owns the pair of accumulation surfaces that make the feedback loop.
///
/// Both surfaces are allocated once at a given size; per-tick operation only
/// flips the role index. A resize recreates the pair in a single call so the
/// read and write surfaces can never disagree on dimensions.
pub struct FeedbackCompositor {
    surfaces: [AccumulationSurface; 2],
    roles: PingPong,
    width: u32,
    height: u32,
    sampler: wgpu::Sampler,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl FeedbackCompositor {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "accumulation surfaces require non-zero dimensions");

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("accumulation_bind_group_layout"),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let surfaces = [
            Self::create_surface(device, &bind_group_layout, &sampler, width, height, "Accumulation A"),
            Self::create_surface(device, &bind_group_layout, &sampler, width, height, "Accumulation B"),
        ];

        Self {
            surfaces,
            roles: PingPong::default(),
            width,
            height,
            sampler,
            bind_group_layout,
        }
    }

    fn create_surface(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        width: u32,
        height: u32,
        label: &str,
    ) -> AccumulationSurface {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: ACCUMULATION_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some(&format!("{} Bind Group", label)),
        });

        AccumulationSurface {
            texture,
            view,
            bind_group,
        }
    }

    /// Recreate both surfaces together at the new size. Callers apply this
    /// between ticks only; a half-resized pair would feed mismatched
    /// geometry into the next composite.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        assert!(width > 0 && height > 0, "accumulation surfaces require non-zero dimensions");

        self.surfaces = [
            Self::create_surface(device, &self.bind_group_layout, &self.sampler, width, height, "Accumulation A"),
            Self::create_surface(device, &self.bind_group_layout, &self.sampler, width, height, "Accumulation B"),
        ];
        self.width = width;
        self.height = height;
    }

    /// The previous tick's accumulated image, sampled by the trail pass.
    pub fn read_source(&self) -> &AccumulationSurface {
        &self.surfaces[self.roles.current()]
    }

    /// This tick's write target.
    pub fn write_target(&self) -> &AccumulationSurface {
        &self.surfaces[self.roles.next()]
    }

    /// Flip the surface roles at the end of a tick.
    pub fn swap(&mut self) {
        self.roles.swap();
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_strictly_alternate() {
        let mut roles = PingPong::default();

        for tick in 0..8 {
            let written = roles.next();
            roles.swap();
            // The surface written this tick is the read source next tick.
            assert_eq!(roles.current(), written, "tick {}", tick);
            assert_ne!(roles.current(), roles.next());
        }
    }

    #[test]
    fn swap_is_an_involution() {
        let mut roles = PingPong::default();
        let initial = roles;

        roles.swap();
        assert_ne!(roles, initial);
        roles.swap();
        assert_eq!(roles, initial);
    }
}
