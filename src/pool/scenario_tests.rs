//! End-to-end scenarios for compact pools
//!
//! These tests drive pools the way a mesh or combinatorial map would.

#[cfg(test)]
mod scenarios {
    use crate::error::Result;
    use crate::pool::{CompactPool, ConstantSize, GrowthConfig, Index, PoolConfig};
    use std::num::NonZeroUsize;

    fn constant<T>(block: usize) -> CompactPool<T, ConstantSize> {
        CompactPool::with_policy(ConstantSize::new(NonZeroUsize::new(block).unwrap()))
    }

    #[test]
    fn test_scenario_lifo_reuse() -> Result<()> {
        let mut pool = constant(4);

        let handles: Vec<u32> = ['a', 'b', 'c', 'd', 'e']
            .into_iter()
            .map(|v| pool.insert(v).map(Index::get))
            .collect::<Result<_>>()?;
        assert_eq!(handles, vec![0, 1, 2, 3, 4]);
        assert_eq!(pool.capacity(), 8);

        pool.erase(Index::new(2))?;
        let f = pool.insert('f')?;
        assert_eq!(f.get(), 2);

        let contents: Vec<(u32, char)> = pool.iter().map(|(i, v)| (i.get(), *v)).collect();
        assert_eq!(
            contents,
            vec![(0, 'a'), (1, 'b'), (2, 'f'), (3, 'd'), (4, 'e')]
        );
        Ok(())
    }

    #[test]
    fn test_scenario_copy_with_holes() -> Result<()> {
        let mut pool = constant(4);
        pool.try_extend([10, 20, 30, 40, 50])?;
        pool.erase(Index::new(1))?;
        pool.erase(Index::new(3))?;

        let copy = pool.clone();
        assert_eq!(copy.len(), 3);
        assert!(copy.capacity() <= pool.capacity());
        assert!(copy.values().eq(pool.values()));
        Ok(())
    }

    #[test]
    fn test_scenario_growth_threading_order() -> Result<()> {
        let mut pool = constant(16);
        pool.try_extend(0..16)?;
        assert_eq!(pool.capacity(), 16);

        // The next block hands out 16..32 in order
        let fresh: Vec<u32> = (0..16)
            .map(|v| pool.insert(v).map(Index::get))
            .collect::<Result<_>>()?;
        assert_eq!(fresh, (16..32u32).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn test_scenario_reuse_before_growth() -> Result<()> {
        let mut pool = constant(8);
        pool.try_extend(0..8)?;
        for raw in [5, 1, 6] {
            pool.erase(Index::new(raw))?;
        }

        let capacity = pool.capacity();
        let mut reused: Vec<u32> = (0..3)
            .map(|v| pool.insert(v).map(Index::get))
            .collect::<Result<_>>()?;
        assert_eq!(pool.capacity(), capacity);
        assert_eq!(reused, vec![6, 1, 5]);
        reused.sort_unstable();
        assert_eq!(reused, vec![1, 5, 6]);

        // Only now does the pool grow
        pool.insert(99)?;
        assert_eq!(pool.capacity(), capacity + 8);
        Ok(())
    }

    /// Vertices and triangles referencing each other by handle
    #[derive(Debug, Clone, PartialEq)]
    struct Vertex {
        position: [f64; 3],
        triangle: Index,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Triangle {
        vertices: [Index; 3],
    }

    #[test]
    fn test_scenario_mesh_edit() -> Result<()> {
        let config = PoolConfig::from_toml_str("[growth]\npolicy = \"doubling\"\nfirst_block_size = 4\n")?;
        let mut vertices: CompactPool<Vertex, GrowthConfig> = CompactPool::with_config(&config)?;
        let mut triangles: CompactPool<Triangle, GrowthConfig> = CompactPool::with_config(&config)?;

        let corners = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
        let v: Vec<Index> = corners
            .iter()
            .map(|&position| {
                vertices.insert(Vertex {
                    position,
                    triangle: Index::default(),
                })
            })
            .collect::<Result<_>>()?;

        let t0 = triangles.insert(Triangle {
            vertices: [v[0], v[1], v[2]],
        })?;
        let t1 = triangles.insert(Triangle {
            vertices: [v[1], v[3], v[2]],
        })?;
        for (&vertex, triangle) in v.iter().zip([t0, t0, t1, t1]) {
            vertices[vertex].triangle = triangle;
        }

        // Flip the shared edge: both triangles replaced, handles reused
        triangles.erase(t1)?;
        triangles.erase(t0)?;
        let t2 = triangles.insert(Triangle {
            vertices: [v[0], v[1], v[3]],
        })?;
        let t3 = triangles.insert(Triangle {
            vertices: [v[0], v[3], v[2]],
        })?;
        assert_eq!((t2, t3), (t0, t1));
        assert_eq!(triangles.capacity(), 4);

        for triangle in triangles.values() {
            for vertex in triangle.vertices {
                assert!(vertices.contains(vertex));
            }
        }
        assert!(vertices.values().all(|vertex| vertex.triangle.is_valid()));
        assert_eq!(vertices[v[3]].position, [1.0, 1.0, 0.0]);
        vertices.check_invariants()?;
        triangles.check_invariants()?;
        Ok(())
    }

    #[test]
    fn test_scenario_merge_meshes() -> Result<()> {
        let mut left = constant(4);
        left.try_extend(["l0", "l1", "l2"])?;
        let mut right = constant(4);
        let r: Vec<Index> = ["r0", "r1"]
            .into_iter()
            .map(|v| right.insert(v))
            .collect::<Result<_>>()?;

        let offset = left.merge(&mut right)?;
        for (handle, name) in r.iter().zip(["r0", "r1"]) {
            let moved = Index::from_usize(handle.to_usize() + offset).unwrap();
            assert_eq!(left[moved], name);
        }
        assert_eq!(left.len(), 5);
        left.check_invariants()?;
        Ok(())
    }

    /// Pseudo-random insert/erase sequence; the free list always accounts
    /// for every unused slot.
    #[test]
    fn test_scenario_index_density() -> Result<()> {
        let mut pool = constant(7);
        let mut live: Vec<Index> = Vec::new();
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;

        for step in 0..5_000u32 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;

            if live.is_empty() || state % 3 != 0 {
                live.push(pool.insert(step)?);
            } else {
                let victim = live.swap_remove((state as usize / 3) % live.len());
                pool.erase(victim)?;
            }

            assert!(pool.len() <= pool.capacity());
            assert_eq!(pool.free_list_len()?, pool.capacity() - pool.len());
        }

        assert_eq!(pool.len(), live.len());
        pool.check_invariants()?;

        live.sort_unstable();
        assert!(pool.indices().eq(live.iter().copied()));
        Ok(())
    }
}
