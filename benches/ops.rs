// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use bpmn_assist::engine::InMemoryModeler;
use bpmn_assist::ops::{decode_commands, execute_batch, validate_all, CommandResult};

mod fixtures;
mod profiler;

use fixtures::Case;

// Benchmark identity (keep stable):
// - Group names in this file: `ops.execute`, `ops.decode`
// - Case IDs (the string after the `/`) must remain stable so results stay comparable
//   over time (`small`, `medium`, `large`).
fn checksum_results(results: &[CommandResult]) -> u64 {
    results.iter().fold(0u64, |acc, result| {
        acc.wrapping_mul(131).wrapping_add(u64::from(result.success()))
    })
}

fn benches_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("ops.execute");
    let blank = InMemoryModeler::blank().expect("blank modeler");

    for case in [Case::Small, Case::Medium, Case::Large] {
        let commands = fixtures::commands(case);
        group.throughput(Throughput::Elements(commands.len() as u64));
        group.bench_function(case.id(), {
            let template = blank.clone();
            move |b| {
                b.iter_batched(
                    || template.clone(),
                    |mut modeler| {
                        let results = execute_batch(&mut modeler, black_box(&commands));
                        black_box(checksum_results(&results))
                    },
                    BatchSize::SmallInput,
                )
            }
        });
    }

    group.finish();
}

fn benches_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("ops.decode");

    for case in [Case::Small, Case::Medium, Case::Large] {
        let candidates = fixtures::command_json(case);
        group.throughput(Throughput::Elements(candidates.len() as u64));
        group.bench_function(case.id(), |b| {
            b.iter(|| {
                let validation = validate_all(black_box(&candidates));
                let decoded = decode_commands(black_box(&candidates)).map(|commands| commands.len());
                black_box((validation.valid, decoded))
            })
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = profiler::criterion();
    targets = benches_execute, benches_decode
}
criterion_main!(benches);
