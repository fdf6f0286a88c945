// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Import/export formats.
//!
//! BPMN 2.0 XML is the only interchange format; it is what `clear` resets to and what the CLI
//! reads and writes.

pub mod bpmn;
