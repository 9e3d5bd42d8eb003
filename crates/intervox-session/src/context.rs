// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Immutable prompt-construction state for one interview.
//!
//! The context is derived once from the candidate-profile snapshot at
//! session creation. Every profile field is optional; missing data becomes a
//! placeholder, so building a context can never fail.

use intervox_core::{Modality, ProfileSnapshot};

/// Instruction used to request the opening turn, before any history exists.
const OPENING_INSTRUCTION: &str =
    "Please start this interview with a professional greeting and your first question.";

/// Immutable prompt state priming the interviewer persona.
#[derive(Debug, Clone)]
pub struct InterviewContext {
    system_prompt: String,
    modality: Modality,
}

impl InterviewContext {
    /// Builds the context from an optional profile snapshot.
    pub fn new(snapshot: Option<&ProfileSnapshot>, modality: Modality) -> Self {
        let name = snapshot
            .and_then(|s| s.name.as_deref())
            .unwrap_or("Not provided");
        let summary = snapshot
            .and_then(|s| s.summary.as_deref())
            .unwrap_or("No resume provided");
        let skills = snapshot
            .filter(|s| !s.skills.is_empty())
            .map(|s| s.skills.join(", "))
            .unwrap_or_else(|| "Not specified".to_string());
        let experience_count = snapshot.map(|s| s.experience_count).unwrap_or(0);

        let channel_note = match modality {
            Modality::Text => "This is a text interview.",
            Modality::Video => {
                "This is a video interview. Pay attention to both verbal responses \
                 and visual cues if images are provided."
            }
        };

        let system_prompt = format!(
            "You are an AI interviewer conducting a professional job interview.\n\
             \n\
             Interview guidelines:\n\
             1. Act like a human recruiter: be friendly, professional, and engaging.\n\
             2. Use the candidate's actual name if provided.\n\
             3. Ask relevant questions based on the candidate's resume.\n\
             4. Follow up on answers with deeper questions.\n\
             5. Assess technical skills, experience, and cultural fit.\n\
             6. Ask one question at a time and wait for responses.\n\
             7. {channel_note}\n\
             \n\
             Candidate information:\n\
             Name: {name}\n\
             Resume summary: {summary}\n\
             Skills: {skills}\n\
             Experience: {experience_count} experience entries found\n"
        );

        Self {
            system_prompt,
            modality,
        }
    }

    /// The system prompt sent as the first segment of every backend call.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// The instruction used to request the opening greeting turn.
    pub fn opening_instruction(&self) -> &'static str {
        OPENING_INSTRUCTION
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }
}
