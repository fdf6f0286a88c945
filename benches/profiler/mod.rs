// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};

const PROFILE_FREQUENCY: i32 = 100;

/// Shared config for the command and context benches. Pass `--profile-time <secs>` to write a
/// pprof flamegraph per benchmark instead of measuring.
pub fn criterion() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(3))
        .with_profiler(PProfProfiler::new(PROFILE_FREQUENCY, Output::Flamegraph(None)))
}
