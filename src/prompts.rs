pub fn user_subject(posts: &str) -> String {
    format!(r#"You are a good writer.
Please generate a new and interesting subject based on my previous facebook posts.
It should be interesting and engaging.
You can consider the likes, comments, and shares of the previous posts.

Provide a short subject. The output should be a single line and only include the subject.
---
PREVIOUS POSTS:
{posts}
---
Suggested Subject:
"#, posts = posts)
}

pub fn user_new_post(subject: &str, posts: &str) -> String {
    format!(r#"You are a good writer.
Please generate a new and interesting facebook post based on the subject and my previous facebook posts.
Please learn tones and styles from the previous posts.
Generate a new post that is interesting and engaging as written by the same author.

Write in the language of the previous posts and the subject.
For example, if the subject is in English, write in English.
If the subject is in Korean, write in Korean.
---
PREVIOUS POSTS:
{posts}
---
Suggested Subject: {subject}
---
New Post:
"#, posts = posts, subject = subject)
}
