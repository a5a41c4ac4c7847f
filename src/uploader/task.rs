/// One unit of work submitted to a [`StreamUploader`](crate::StreamUploader).
///
/// `task_id` is only used for logs and diagnostics; it is not deduplicated and not
/// matched against acknowledgements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask<Id, Req> {
    pub task_id: Id,
    pub request: Req,
}

impl<Id, Req> UploadTask<Id, Req> {
    pub fn new(task_id: Id, request: Req) -> Self {
        Self { task_id, request }
    }
}
