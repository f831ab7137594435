// Interview LLM prompt templates.
// Placeholders in braces are substituted by `fill` before the call.

pub const INTERVIEWER_SYSTEM: &str = "\
You are an expert technical hiring manager running a structured interview. \
You MUST respond with valid JSON only, no markdown fences, no explanations. \
Judge candidates only on what they actually wrote.";

pub const QUESTIONS_PROMPT: &str = r#"Generate 5 targeted interview questions for this candidate.
Mix technical depth with behavioural questions, and tie them to the job requirements.

JOB REQUIREMENTS:
{job_description}

CANDIDATE'S SKILLS:
{candidate_skills}

OUTPUT SCHEMA (return exactly this structure):
{
  "questions": ["string", "string", "string", "string", "string"]
}"#;

pub const SCORE_ANSWER_PROMPT: &str = r#"Evaluate the candidate's answer to the interview question below.
Give a score from 0 to 10 and concise, constructive feedback.

QUESTION:
{question}

CANDIDATE'S ANSWER:
{answer}

OUTPUT SCHEMA (return exactly this structure):
{
  "score": integer 0-10,
  "feedback": "string"
}"#;

pub const SCORECARD_PROMPT: &str = r#"Act as a senior hiring manager reviewing a completed interview.
Write a scorecard based only on the transcript and per-answer evaluations.

JOB REQUIREMENTS:
{job_description}

INTERVIEW TRANSCRIPT & EVALUATION:
{transcript}

OUTPUT SCHEMA (return exactly this structure):
{
  "overall_summary": "string",
  "strengths": ["string"],
  "areas_for_improvement": ["string"],
  "final_recommendation": "string"
}"#;

pub const FIT_PROMPT: &str = r#"Decide whether the candidate's resume is a good fit for the job description.

JOB DESCRIPTION:
{job_description}

CANDIDATE RESUME:
{resume_text}

OUTPUT SCHEMA (return exactly this structure):
{
  "shortlisted": boolean,
  "reason": "brief explanation"
}"#;

pub const CASUAL_PROMPT: &str = r#"Rewrite this interview question in a friendly, conversational tone.
Keep its meaning and difficulty unchanged.

QUESTION:
{question}

OUTPUT SCHEMA (return exactly this structure):
{
  "casual_question": "string"
}"#;

/// Substitutes `{name}` placeholders in one pass. Inserted values are never
/// rescanned, and braces that name no known placeholder are kept verbatim.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let substitution = tail[1..].find('}').and_then(|close| {
            let name = &tail[1..=close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close + 2))
        });
        match substitution {
            Some((value, consumed)) => {
                out.push_str(value);
                rest = &tail[consumed..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
