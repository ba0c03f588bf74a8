use crate::vertex::SceneVertex;

/// 一份 indexed mesh 数据，顶点和索引已经合并好
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub vertices: Vec<SceneVertex>,
    pub indices: Vec<u32>,
}

/// 单位立方体，每个面 4 个顶点独立法线，共 24 顶点 36 索引
fn unit_cube() -> Mesh {
    // (normal, 面内四个角的位置)，按 CCW 排列
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        // +X
        ([1.0, 0.0, 0.0], [[1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0], [1.0, -1.0, 1.0]]),
        // -X
        ([-1.0, 0.0, 0.0], [[-1.0, 1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0]]),
        // +Y
        ([0.0, 1.0, 0.0], [[1.0, 1.0, -1.0], [-1.0, 1.0, -1.0], [-1.0, 1.0, 1.0], [1.0, 1.0, 1.0]]),
        // -Y
        ([0.0, -1.0, 0.0], [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0]]),
        // +Z
        ([0.0, 0.0, 1.0], [[-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0]]),
        // -Z
        ([0.0, 0.0, -1.0], [[1.0, -1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [1.0, 1.0, -1.0]]),
    ];
    let face_uvs: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    let mut mesh = Mesh::default();
    for (normal, corners) in &faces {
        let base = mesh.vertices.len() as u32;
        for (corner, uv) in corners.iter().zip(face_uvs.iter()) {
            mesh.vertices.push(SceneVertex {
                position: *corner,
                normal: *normal,
                // 颜色种子直接取位置的绝对值，shader 内做为 albedo 的基础
                color: [corner[0].abs(), corner[1].abs(), corner[2].abs()],
                uv: *uv,
                object_id: 0,
            });
        }
        mesh.indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    mesh
}

/// 将 base mesh 复制 n_objects 份合并为一个场景 mesh，
/// 每份顶点打上 object id，索引做相应偏移
pub fn merged_scene_mesh(n_objects: u32) -> Mesh {
    let base = unit_cube();
    let mut scene = Mesh::default();
    scene.vertices.reserve(base.vertices.len() * n_objects as usize);
    scene.indices.reserve(base.indices.len() * n_objects as usize);

    for id in 0..n_objects {
        let vertex_offset = scene.vertices.len() as u32;
        for v in &base.vertices {
            let mut v = *v;
            v.object_id = id;
            scene.vertices.push(v);
        }
        for i in &base.indices {
            scene.indices.push(i + vertex_offset);
        }
    }
    scene
}

/// 按 object id 将每个对象的 uv 映射进共享纹理图集的一个 tile。
/// tile 网格为 ceil(sqrt(n)) 列，buffer_size 用于半像素 inset 防止 tile 间采样渗色
pub fn apply_uv_atlas(vertices: &mut [SceneVertex], n_objects: u32, buffer_size: u32) {
    let m = (n_objects as f32).sqrt().ceil().max(1.0) as u32;
    let tile = 1.0 / m as f32;
    let inset = 0.5 / buffer_size as f32;
    // inset 收在 tile 内部，uv 范围是 [inset, tile - inset]，边缘 tile 不会越出 [0, 1]
    let span = tile - 2.0 * inset;

    for v in vertices.iter_mut() {
        let col = (v.object_id % m) as f32;
        let row = (v.object_id / m) as f32;
        v.uv = [
            col * tile + inset + v.uv[0].clamp(0.0, 1.0) * span,
            row * tile + inset + v.uv[1].clamp(0.0, 1.0) * span,
        ];
    }
}

/// 全屏 quad，用于 lighting resolve 阶段逐像素遍历 g-buffer
pub fn quad_mesh() -> Mesh {
    Mesh {
        vertices: vec![
            SceneVertex {
                position: [-1.0, 0.0, 1.0],
                normal: [0.0, 0.0, 0.0],
                color: [1.0, 0.0, 1.0],
                uv: [0.0, 1.0],
                object_id: 0,
            },
            SceneVertex {
                position: [-1.0, 0.0, -1.0],
                normal: [0.0, 0.0, 0.0],
                color: [1.0, 0.0, 1.0],
                uv: [0.0, 0.0],
                object_id: 0,
            },
            SceneVertex {
                position: [1.0, 0.0, -1.0],
                normal: [0.0, 0.0, 0.0],
                color: [1.0, 0.0, 1.0],
                uv: [1.0, 0.0],
                object_id: 0,
            },
            SceneVertex {
                position: [1.0, 0.0, 1.0],
                normal: [0.0, 0.0, 0.0],
                color: [1.0, 0.0, 1.0],
                uv: [1.0, 1.0],
                object_id: 0,
            },
        ],
        indices: vec![0, 1, 2, 2, 3, 0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_mesh_counts() {
        let mesh = merged_scene_mesh(9);
        assert_eq!(mesh.vertices.len(), 9 * 24);
        assert_eq!(mesh.indices.len(), 9 * 36);
        // 每份顶点都打上了正确的 object id
        assert!(mesh.vertices.iter().enumerate().all(|(i, v)| v.object_id == (i / 24) as u32));
        // 索引不越界
        let max = *mesh.indices.iter().max().unwrap();
        assert!((max as usize) < mesh.vertices.len());
    }

    #[test]
    fn test_merged_mesh_index_offsets() {
        let mesh = merged_scene_mesh(2);
        // 第二份的索引全部落在第二份顶点的区间内
        assert!(mesh.indices[36..].iter().all(|&i| (24..48).contains(&i)));
    }

    #[test]
    fn test_uv_atlas_stays_in_unit_range() {
        let mut mesh = merged_scene_mesh(10);
        apply_uv_atlas(&mut mesh.vertices, 10, 2560);
        for v in &mesh.vertices {
            assert!(v.uv[0] >= 0.0 && v.uv[0] <= 1.0, "u out of range: {}", v.uv[0]);
            assert!(v.uv[1] >= 0.0 && v.uv[1] <= 1.0, "v out of range: {}", v.uv[1]);
        }
    }

    #[test]
    fn test_uv_atlas_inset_keeps_last_tile_inside() {
        // 4 objects -> 2x2 网格，object 3 是右下角 tile，
        // 其 uv 上界必须收进半像素 inset 之内
        let mut mesh = merged_scene_mesh(4);
        apply_uv_atlas(&mut mesh.vertices, 4, 2560);
        let inset = 0.5 / 2560.0;
        let last_tile = &mesh.vertices[3 * 24..];
        for v in last_tile {
            assert!(v.uv[0] <= 1.0 - inset + 1e-6, "u leaks out of tile: {}", v.uv[0]);
            assert!(v.uv[1] <= 1.0 - inset + 1e-6, "v leaks out of tile: {}", v.uv[1]);
            assert!(v.uv[0] >= 0.5 + inset - 1e-6);
            assert!(v.uv[1] >= 0.5 + inset - 1e-6);
        }
    }

    #[test]
    fn test_uv_atlas_distinct_tiles() {
        let mut mesh = merged_scene_mesh(4);
        apply_uv_atlas(&mut mesh.vertices, 4, 2560);
        // object 0 和 object 3 的第一个顶点落在不同 tile
        let a = mesh.vertices[0].uv;
        let b = mesh.vertices[3 * 24].uv;
        assert!(a != b);
    }

    #[test]
    fn test_quad_mesh_two_triangles() {
        let quad = quad_mesh();
        assert_eq!(quad.vertices.len(), 4);
        assert_eq!(quad.indices, vec![0, 1, 2, 2, 3, 0]);
    }
}
