// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Read-only queries over the live diagram.
//!
//! Queries provide derived views (currently the assistant's context snapshot) and never mutate.

pub mod context;

pub use context::{context_json, extract_context, ElementSummary};
