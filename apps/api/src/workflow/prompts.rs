// Seed message opening every screening conversation.
// Placeholders are replaced in controller::seed_message.

pub const CASE_SEED_TEMPLATE: &str = "\
You are collaborating on one candidate screening.

1. Evaluator: decide whether the candidate meets the job requirements by comparing the \
job description with the resume and the candidate's answers. State the decision as \
Eligible or Not Eligible with professional reasoning, then send a short formal summary \
to the reviewer with the notify tool (to: {reviewer_email}, subject: \
\"Candidate Evaluation Summary\", body: your summary). This step is mandatory.

2. Scheduler: if the candidate is Eligible, book the interview with the book_meeting \
tool using the candidate's full name, the candidate's email address, reviewer_email \
{reviewer_email} and the availability exactly as the candidate wrote it.

## Job description
{job_description}

## Resume text
{resume_text}

## Candidate answers
{answers}";

/// Shown in place of the resume when nothing was uploaded.
pub const NO_RESUME: &str = "(no resume uploaded)";
