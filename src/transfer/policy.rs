//! Authorization Policy
//!
//! Pure predicates over already-loaded entities; no I/O. The workflow
//! enforces these and the advisory `can_*` API mirrors them exactly, so
//! everything lives here in one place.
//!
//! The full-privilege bypass (team leader / administrator / superuser) is a
//! single shared rule consumed by every predicate - the admin override for
//! stuck requests - never duplicated per method.

use super::types::{ContigTransferRequest, Person, Project, Role};

/// Privilege that lets a person open a transfer request for any contig.
pub const MOVE_ANY_CONTIG: &str = "move_any_contig";

/// The uniform admin bypass: full-privilege roles skip ordinary checks.
pub fn is_full_privilege(person: &Person) -> bool {
    matches!(
        person.role,
        Role::TeamLeader | Role::Administrator | Role::Superuser
    )
}

/// May `requester` open a transfer request moving a contig from `source`
/// to `dest`?
///
/// Allowed when the requester owns the source and the destination is the
/// bin, owns the destination, or holds the `move_any_contig` privilege.
pub fn can_create(requester: &Person, source: &Project, dest: &Project) -> bool {
    if is_full_privilege(requester) {
        return true;
    }
    (source.is_owned_by(&requester.username) && dest.is_bin)
        || dest.is_owned_by(&requester.username)
        || requester.has_privilege(MOVE_ANY_CONTIG)
}

/// May `person` cancel `request`? Only the original requester (the edge
/// check elsewhere confines this to non-terminal states).
pub fn can_cancel(person: &Person, request: &ContigTransferRequest) -> bool {
    if is_full_privilege(person) {
        return true;
    }
    request.requester == person.username
}

/// May `person` approve or refuse `request`?
///
/// The contig's current owner decides; the destination owner (or the
/// requester, self-approving) may step in when the source is unowned or
/// the bin.
pub fn can_review(
    person: &Person,
    request: &ContigTransferRequest,
    source: &Project,
    dest: &Project,
) -> bool {
    if is_full_privilege(person) {
        return true;
    }
    if source.is_owned_by(&person.username) {
        return true;
    }
    let relaxed_source = source.is_unowned() || source.is_bin;
    if relaxed_source && dest.is_owned_by(&person.username) {
        return true;
    }
    relaxed_source && request.requester == person.username
}

/// May `person` execute an approved `request`? Requester, source owner or
/// destination owner.
pub fn can_execute(
    person: &Person,
    request: &ContigTransferRequest,
    source: &Project,
    dest: &Project,
) -> bool {
    if is_full_privilege(person) {
        return true;
    }
    request.requester == person.username
        || source.is_owned_by(&person.username)
        || dest.is_owned_by(&person.username)
}

/// May `person` acquire the lock on `project` for themselves?
pub fn can_lock(person: &Person, project: &Project) -> bool {
    if is_full_privilege(person) {
        return true;
    }
    project.is_unowned() || project.is_owned_by(&person.username)
}

/// May `person` release the lock on `project`? Only the holder.
pub fn can_unlock(person: &Person, project: &Project) -> bool {
    if is_full_privilege(person) {
        return true;
    }
    project.is_locked_by(&person.username)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::transfer::status::RequestStatus;

    fn person(name: &str, role: Role) -> Person {
        Person::new(name, role)
    }

    fn request(requester: &str) -> ContigTransferRequest {
        ContigTransferRequest {
            id: 1,
            contig_id: 7,
            old_project: 1,
            new_project: 2,
            requester: requester.to_string(),
            requester_comment: None,
            reviewer: None,
            reviewer_comment: None,
            status: RequestStatus::Pending,
            opened: Utc::now(),
            reviewed: None,
            closed: None,
        }
    }

    #[test]
    fn test_full_privilege_roles() {
        assert!(is_full_privilege(&person("tl", Role::TeamLeader)));
        assert!(is_full_privilege(&person("adm", Role::Administrator)));
        assert!(is_full_privilege(&person("root", Role::Superuser)));
        assert!(!is_full_privilege(&person("fin", Role::Finisher)));
        assert!(!is_full_privilege(&person("ann", Role::Annotator)));
    }

    #[test]
    fn test_create_own_source_to_bin() {
        let alice = person("alice", Role::Finisher);
        let source = Project::new(1, "PKN01").with_owner("alice");
        let bin = Project::new(2, "BIN").as_bin();
        assert!(can_create(&alice, &source, &bin));

        // Not to an arbitrary project she does not own
        let other = Project::new(3, "PKN03").with_owner("bob");
        assert!(!can_create(&alice, &source, &other));
    }

    #[test]
    fn test_create_into_own_destination() {
        let alice = person("alice", Role::Finisher);
        let source = Project::new(1, "PKN01").with_owner("bob");
        let dest = Project::new(2, "PKN02").with_owner("alice");
        assert!(can_create(&alice, &source, &dest));
    }

    #[test]
    fn test_create_with_move_any_contig() {
        let alice = person("alice", Role::Finisher).with_privilege(MOVE_ANY_CONTIG);
        let source = Project::new(1, "PKN01").with_owner("bob");
        let dest = Project::new(2, "PKN02").with_owner("carol");
        assert!(can_create(&alice, &source, &dest));
    }

    #[test]
    fn test_create_full_privilege_bypass() {
        let tl = person("tl", Role::TeamLeader);
        let source = Project::new(1, "PKN01").with_owner("bob");
        let dest = Project::new(2, "PKN02").with_owner("carol");
        assert!(can_create(&tl, &source, &dest));
    }

    #[test]
    fn test_cancel_only_requester_or_admin() {
        let req = request("alice");
        assert!(can_cancel(&person("alice", Role::Finisher), &req));
        assert!(!can_cancel(&person("bob", Role::Finisher), &req));
        assert!(can_cancel(&person("tl", Role::TeamLeader), &req));
    }

    #[test]
    fn test_review_source_owner_decides() {
        let req = request("alice");
        let source = Project::new(1, "PKN01").with_owner("owen");
        let dest = Project::new(2, "PKN02").with_owner("alice");

        assert!(can_review(&person("owen", Role::Finisher), &req, &source, &dest));
        // Destination owner may not override an owned source
        assert!(!can_review(&person("alice", Role::Finisher), &req, &source, &dest));
        assert!(!can_review(&person("bob", Role::Finisher), &req, &source, &dest));
    }

    #[test]
    fn test_review_relaxed_when_source_unowned_or_bin() {
        let req = request("alice");
        let unowned = Project::new(1, "PKN01");
        let bin = Project::new(1, "BIN").as_bin().with_owner("keeper");
        let dest = Project::new(2, "PKN02").with_owner("dana");

        // Destination owner steps in for an unowned source
        assert!(can_review(&person("dana", Role::Finisher), &req, &unowned, &dest));
        // Requester may self-approve out of an unowned source or the bin
        assert!(can_review(&person("alice", Role::Finisher), &req, &unowned, &dest));
        assert!(can_review(&person("alice", Role::Finisher), &req, &bin, &dest));
        // A bystander still may not
        assert!(!can_review(&person("bob", Role::Finisher), &req, &unowned, &dest));
    }

    #[test]
    fn test_execute_parties() {
        let req = request("alice");
        let source = Project::new(1, "PKN01").with_owner("owen");
        let dest = Project::new(2, "PKN02").with_owner("dana");

        assert!(can_execute(&person("alice", Role::Finisher), &req, &source, &dest));
        assert!(can_execute(&person("owen", Role::Finisher), &req, &source, &dest));
        assert!(can_execute(&person("dana", Role::Finisher), &req, &source, &dest));
        assert!(!can_execute(&person("bob", Role::Finisher), &req, &source, &dest));
        assert!(can_execute(&person("root", Role::Superuser), &req, &source, &dest));
    }

    #[test]
    fn test_unlock_only_holder_or_admin() {
        let mut project = Project::new(1, "PKN01").with_owner("alice");
        project.lock_owner = Some("alice".to_string());
        project.lock_date = Some(Utc::now());

        assert!(can_unlock(&person("alice", Role::Finisher), &project));
        assert!(!can_unlock(&person("bob", Role::Finisher), &project));
        assert!(can_unlock(&person("adm", Role::Administrator), &project));
    }

    #[test]
    fn test_lock_owner_or_unowned() {
        let owned = Project::new(1, "PKN01").with_owner("alice");
        assert!(can_lock(&person("alice", Role::Finisher), &owned));
        assert!(!can_lock(&person("bob", Role::Finisher), &owned));

        let unowned = Project::new(2, "PKN02");
        assert!(can_lock(&person("bob", Role::Finisher), &unowned));
    }
}
