// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persistence for user settings on disk.
//!
//! The store reads/writes a single JSON settings file used by the CLI to remember the assistant
//! endpoint, model and credential between runs.

pub mod settings;

pub use settings::{AssistantSettings, SettingsError, SettingsStore};
