//! Diesel schema for research task persistence.

diesel::table! {
    /// Research task records keyed by their public task identifier.
    research_tasks (task_id) {
        /// Public task identifier.
        #[max_length = 100]
        task_id -> Varchar,
        /// Display title.
        #[max_length = 255]
        title -> Varchar,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Completion percentage (0-100).
        progress -> Int4,
        /// In-progress phase label.
        #[max_length = 255]
        current_step -> Nullable<Varchar>,
        /// Failure diagnostic text.
        error_message -> Nullable<Text>,
        /// Target region name.
        #[max_length = 100]
        region_name -> Varchar,
        /// Target region code.
        #[max_length = 100]
        region_id -> Varchar,
        /// Research breadth parameter.
        breadth -> Int4,
        /// Research depth parameter.
        depth -> Int4,
        /// Opaque worker configuration payload.
        config -> Jsonb,
        /// Weak reference into the municipality catalog.
        municipality_id -> Nullable<Int8>,
        /// Delegation start timestamp.
        start_time -> Nullable<Timestamptz>,
        /// Terminal-state timestamp.
        end_time -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Report attachments owned by research tasks.
    research_reports (id) {
        /// Report row identifier.
        id -> Uuid,
        /// Owning task identifier.
        #[max_length = 100]
        task_id -> Varchar,
        /// Report format tag.
        #[max_length = 50]
        report_type -> Varchar,
        /// Report title.
        #[max_length = 255]
        title -> Varchar,
        /// Inline payload for textual formats.
        content -> Nullable<Text>,
        /// Path to externally stored bytes for file-based formats.
        #[max_length = 255]
        file_path -> Nullable<Varchar>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(research_tasks, research_reports);
