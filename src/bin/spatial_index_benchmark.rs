use std::time::{Duration, Instant};

use anyhow::Result;
use glam::IVec2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use village_spatial::spatial_index::*;
use village_spatial::world::*;

const WORLD_SIZE: i32 = 1024;

fn random_pos(rng: &mut StdRng) -> IVec2 {
    IVec2::new(rng.gen_range(0..WORLD_SIZE), rng.gen_range(0..WORLD_SIZE))
}

fn random_object(rng: &mut StdRng) -> SpatialObject {
    let pos = random_pos(rng);
    match rng.gen_range(0..10) {
        0..=3 => SpatialObject::resource(ObjectKind::Tree, pos),
        4 => SpatialObject::resource(ObjectKind::Gold, pos),
        5 => SpatialObject::building(ObjectKind::House, pos, TeamId(rng.gen_range(0..4))),
        6 => SpatialObject::agent(UnitClass::Archer, pos, TeamId(rng.gen_range(0..4))),
        _ => SpatialObject::agent(UnitClass::Villager, pos, TeamId(rng.gen_range(0..4))),
    }
}

fn per_query_ms(total: Duration, queries: usize) -> f64 {
    total.as_secs_f64() * 1000.0 / queries as f64
}

fn main() -> Result<()> {
    env_logger::init();
    println!("=== Spatial Index Benchmark ===\n");

    let config = SpatialIndexConfig::for_world(WORLD_SIZE, WORLD_SIZE);
    println!("Configuration:");
    println!("  World size: {}x{}", config.world_width, config.world_height);
    println!("  Cell size: {}", config.cell_size);
    println!("  Cells: {}x{}", config.cells_x(), config.cells_y());
    println!("  Precomputed radius: {}", config.max_precomputed_radius);
    println!();

    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut arena = ObjectArena::new();
    let mut index = SpatialIndex::new(config)?;

    println!("=== Object Insertion ===");
    for &count in &[1_000, 5_000, 10_000, 25_000] {
        let start = Instant::now();
        for _ in 0..count {
            let id = arena.spawn(random_object(&mut rng));
            index.insert(&arena, id);
        }
        let elapsed = start.elapsed();
        println!(
            "{} objects: {:.2}ms ({:.0} objects/sec)",
            count,
            elapsed.as_secs_f64() * 1000.0,
            count as f64 / elapsed.as_secs_f64()
        );
    }

    let start = Instant::now();
    index.rebuild(&arena);
    println!("Rebuild of {} objects: {:.2}ms", arena.len(), start.elapsed().as_secs_f64() * 1000.0);

    println!("\n=== Nearest Queries ===");
    let num_queries = 1_000;
    for &max_dist in &[8, 32, 128, 512] {
        let mut total_time = Duration::ZERO;
        let mut hits = 0;
        for _ in 0..num_queries {
            let origin = random_pos(&mut rng);
            let start = Instant::now();
            let found = index.find_nearest_of_kind(&arena, origin, ObjectKind::Gold, max_dist);
            total_time += start.elapsed();
            hits += usize::from(found.is_some());
        }
        println!(
            "  Gold within {}: avg {:.4}ms, {} hits",
            max_dist,
            per_query_ms(total_time, num_queries),
            hits
        );
    }

    println!("\n=== Enemy Queries ===");
    let mut total_time = Duration::ZERO;
    for _ in 0..num_queries {
        let origin = random_pos(&mut rng);
        let team = TeamId(rng.gen_range(0..4));
        let start = Instant::now();
        index.find_nearest_enemy_presence(&arena, origin, team, 64, &DistinctTeams);
        total_time += start.elapsed();
    }
    println!("  Enemy presence within 64: avg {:.4}ms", per_query_ms(total_time, num_queries));

    println!("\n=== Range Collection ===");
    let mut out = Vec::new();
    for &range in &[8, 16, 32, 64] {
        let mut total_time = Duration::ZERO;
        let mut total_results = 0;
        for _ in 0..num_queries {
            let origin = random_pos(&mut rng);
            out.clear();
            let start = Instant::now();
            total_results +=
                index.collect_in_range(&arena, origin, ObjectKind::Tree, range, &mut out);
            total_time += start.elapsed();
        }
        println!(
            "  Range {}: avg {:.4}ms, avg {} results",
            range,
            per_query_ms(total_time, num_queries),
            total_results / num_queries
        );
    }

    println!("\n=== Parallel Batch Queries ===");
    let executor = ParallelQueryExecutor::new(num_cpus::get())?;
    for &batch_size in &[100, 1_000, 10_000] {
        let requests: Vec<_> = (0..batch_size)
            .map(|_| {
                let team = TeamId(rng.gen_range(0..4));
                NearestRequest::new(random_pos(&mut rng), 64, QueryFilter::EnemyAgent(team))
            })
            .collect();

        let start = Instant::now();
        let results = executor.execute_batch(&index, &arena, &requests, &DistinctTeams);
        let elapsed = start.elapsed();
        println!(
            "  Batch size {}: {:.2}ms ({:.4}ms per query), {} matches",
            batch_size,
            elapsed.as_secs_f64() * 1000.0,
            per_query_ms(elapsed, batch_size),
            results.iter().filter(|r| r.is_some()).count()
        );
    }

    println!("\n=== Object Movement ===");
    let ids: Vec<_> = arena.iter_live().map(|(id, _)| id).collect();
    for &move_count in &[100, 1_000, 5_000] {
        let start = Instant::now();
        for _ in 0..move_count {
            let id = ids[rng.gen_range(0..ids.len())];
            let step = IVec2::new(rng.gen_range(-3..=3), rng.gen_range(-3..=3));
            let Some(pos) = arena.get(id).map(|o| o.pos) else {
                continue;
            };
            let target = (pos + step).clamp(IVec2::ZERO, IVec2::splat(WORLD_SIZE - 1));
            if let Some(old) = arena.set_position(id, target) {
                index.update(&arena, id, old);
            }
        }
        let elapsed = start.elapsed();
        println!(
            "  {} moves: {:.2}ms ({:.0} moves/sec)",
            move_count,
            elapsed.as_secs_f64() * 1000.0,
            move_count as f64 / elapsed.as_secs_f64()
        );
    }

    let drift = index.audit(&arena);
    println!("\nAudit after movement: {} inconsistencies", drift.len());

    let stats = index.stats();
    println!("\n=== Index Statistics ===");
    println!("  Indexed objects: {}", stats.indexed_objects);
    println!("  Occupied cells: {}/{}", stats.grid.occupied_cells, stats.grid.total_cells);
    println!("  Max objects per cell: {}", stats.grid.max_entries_per_cell);
    for kind in ObjectKind::ALL {
        let count = stats.objects_of(kind);
        if count > 0 {
            println!("  {:?}: {}", kind, count);
        }
    }

    Ok(())
}
