// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! BPMN Assist: a BPMN diagram editing core driven by a language-model assistant.
//!
//! Free-text requests go to a chat-completion endpoint together with a snapshot of the current
//! diagram; the reply is screened into [`ops::TransformCommand`]s which are applied one by one
//! against a [`engine::DiagramEngine`], each failure isolated from the rest of the batch.

pub mod assistant;
pub mod engine;
pub mod format;
pub mod model;
pub mod ops;
pub mod query;
pub mod session;
pub mod store;
