// Job description conversion prompt templates.

pub const JD_CONVERT_SYSTEM: &str = "\
You are an expert job description parser. \
You receive raw job description text, often scraped from a web page and full of navigation noise, \
and extract the posting into a strict JSON object. \
Ignore sign-in prompts, cookie banners and lists of similar jobs.";

pub const JD_CONVERT_PROMPT_TEMPLATE: &str = r#"Extract the job posting below into JSON.

JOB DESCRIPTION:
{jd_text}

OUTPUT SCHEMA (return exactly this structure):
{
  "title": "string — full title of the position",
  "level": "Entry" | "Mid" | "Senior",
  "location": "string — primary location (city, state, country or Remote)",
  "description": "string — high-level summary of the role and company",
  "key_qualifications": "string — required experience, skills and education",
  "preferred_qualifications": "string — optional but desired qualifications",
  "responsibilities": "string — primary duties",
  "company": "string — hiring company name"
}

RULES:
1. level must be exactly one of "Entry", "Mid", "Senior".
   Infer it from years of experience and scope.
2. If a field is not present, infer it when obvious, otherwise use an empty string.
3. Return ONLY the JSON object."#;
