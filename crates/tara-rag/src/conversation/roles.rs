//! Audience roles and their response framing

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

const STUDENT_INSTRUCTIONS: &str = "You are a helpful teaching assistant responding to a student. Focus on:
- Explaining concepts clearly using simple language
- Breaking down complex ideas into manageable parts
- Providing relevant examples that illustrate key points
- Guiding the learning process without directly solving homework problems
- Encouraging critical thinking and deeper understanding of the material
- Using a supportive and encouraging tone";

const PROFESSOR_INSTRUCTIONS: &str = "You are a teaching assistant supporting a professor. Focus on:
- Providing in-depth analysis of academic topics
- Suggesting effective teaching approaches for complex concepts
- Offering research-informed perspectives on the subject matter
- Discussing pedagogical strategies and assessment options
- Referencing relevant academic literature when appropriate
- Using a collegial, professional tone";

/// Who the assistant is talking to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Professor,
}

impl Role {
    /// Instruction prefix prepended to every narrative question
    pub fn instructions(&self) -> &'static str {
        match self {
            Role::Student => STUDENT_INSTRUCTIONS,
            Role::Professor => PROFESSOR_INSTRUCTIONS,
        }
    }

    /// Opening message once the knowledge base has content
    pub fn greeting(&self) -> &'static str {
        match self {
            Role::Student => "I'm your study assistant ready to help with your course materials. What questions do you have about the content?",
            Role::Professor => "I'm your teaching assistant ready to support your course delivery. I can help create content, answer common questions, or assist with research based on the uploaded materials.",
        }
    }

    /// Prompt shown while the knowledge base is empty
    pub fn upload_guidance(&self) -> &'static str {
        match self {
            Role::Student => "Upload and process your course materials to start getting help with your studies.",
            Role::Professor => "Upload and process course materials to build a knowledge base for your students and teaching support.",
        }
    }

    /// Heading for the uploaded materials
    pub fn library_title(&self) -> &'static str {
        match self {
            Role::Student => "Course Materials",
            Role::Professor => "Knowledge Repository",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Professor => "professor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "professor" => Ok(Role::Professor),
            other => Err(Error::InvalidRequest(format!(
                "unknown role '{}', expected student or professor",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_role_is_student() {
        assert_eq!(Role::default(), Role::Student);
        assert!(Role::Student.instructions().contains("responding to a student"));
        assert!(Role::Professor.instructions().contains("supporting a professor"));
    }

    #[test]
    fn test_parse_role() {
        assert_eq!("Professor".parse::<Role>().unwrap(), Role::Professor);
        assert_eq!(" student ".parse::<Role>().unwrap(), Role::Student);
        assert!(matches!("dean".parse::<Role>(), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Professor).unwrap(), "\"professor\"");
        let role: Role = serde_json::from_str("\"student\"").unwrap();
        assert_eq!(role, Role::Student);
    }
}
