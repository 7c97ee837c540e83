//! Sample transcript generator. Produces demo input for the pipeline.
//!
//! Asks the model for a variation of a built-in onboarding call; falls back to
//! the built-in transcript itself when the model gives nothing.

use crate::domain::{CompletionOutcome, GeneratedTranscript};
use crate::usecases::completion_service::CompletionService;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Base transcript: a CRM onboarding call with four clear action items.
pub const BASE_TRANSCRIPT: &str = "Meeting Date: November 15, 2024
Participants: Lisa, Jennifer (Real Estate Agent)
Lisa: Hi Jennifer, thanks for hopping on this call. I wanted to walk through where we are with your Follow Up Boss setup and make sure we're on track for your go-live date.
Jennifer: Absolutely! I'm excited to finally get this rolling. I've been so overwhelmed trying to manage my leads manually.
Lisa: Totally understandable. So, based on what we discussed last week, here's what we need to knock out over the next two weeks.
Lisa: First, we need to finalize your lead source tracking. I'll need you to send me a list of all your lead sources - Zillow, Realtor.com, your website, referrals, open houses, etc. - by Friday.
Jennifer Martinez: Got it. I'll pull that together and email it to you by end of week.
Lisa: Perfect. Second, we need to set up your automated drip campaigns. I'm going to need you to review the email templates I sent you last Monday and let me know if you want to make any changes. Can you get me your feedback by Wednesday?
Jennifer Martinez: Yes, I'll review those tonight and send you my edits by Wednesday morning.
Lisa: Awesome. Third, we need to schedule a training session for your assistant, Sarah, so she knows how to use Follow Up Boss for lead entry and task management. Can you have her pick a time on my calendar for next week?
Jennifer Martinez: Absolutely. I'll have her book something today.
Lisa: Great. And lastly, I want to make sure we're integrating your showing software - ShowingTime, right? - with Follow Up Boss so that when a showing gets scheduled, it automatically creates a follow-up task. I'll handle the technical setup, but I'll need your ShowingTime login credentials. Can you send those to me via our secure portal by Thursday?
Jennifer Martinez: Yep, I'll do that tomorrow.
Lisa: Perfect. So just to recap: lead source list by Friday, email template feedback by Wednesday, Sarah books her training for next week, and ShowingTime credentials by Thursday. Does that all sound doable?
Jennifer Martinez: Yes, totally doable. I really appreciate you breaking this down for me.
Lisa: Of course! That's what we're here for. I'll check in with you on Friday to make sure everything's on track, and we should be good to go live by December 1st.
Jennifer Martinez: Sounds great. Thanks, Lisa!
Lisa: Anytime. Talk soon!";

pub struct SampleTranscriptService {
    completion: Arc<CompletionService>,
}

impl SampleTranscriptService {
    pub fn new(completion: Arc<CompletionService>) -> Self {
        Self { completion }
    }

    fn generation_prompt() -> String {
        format!(
            "Generate a random sample meeting transcript with similar structure, participants, \
             and action items as the following transcript. Change names, dates, and details, \
             but keep the format and number of action items. Transcript: {}",
            BASE_TRANSCRIPT
        )
    }

    /// Generate a transcript. Never fails: returns [`BASE_TRANSCRIPT`] when the model gives nothing.
    pub async fn generate_sample_transcript(&self) -> String {
        self.generate().await.0
    }

    /// Same as [`Self::generate_sample_transcript`], with timing metadata.
    pub async fn generate_with_metadata(&self) -> GeneratedTranscript {
        let started = Instant::now();
        let (transcript, fallback_used) = self.generate().await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        GeneratedTranscript {
            transcript,
            fallback_used,
            executed_at: Utc::now(),
            duration_ms,
        }
    }

    async fn generate(&self) -> (String, bool) {
        let prompt = Self::generation_prompt();
        let variants = [
            " Return only the transcript text lines. Do not include explanations or JSON.",
            " Respond with transcript text only. Include speaker names and action items. Do not return empty text.",
        ];

        for suffix in variants {
            if let CompletionOutcome::Text(text) =
                self.completion.try_complete(&format!("{}{}", prompt, suffix)).await
            {
                info!(len = text.len(), "sample transcript generated");
                return (text, false);
            }
        }

        warn!("sample transcript generation returned nothing, using base transcript");
        (BASE_TRANSCRIPT.to_string(), true)
    }
}
