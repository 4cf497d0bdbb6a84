//! Cross-module tests that drive the parser, document and generator together.

use crate::*;

mod logging;

const END_TO_END: &str = "\
[groups]
admins = alice, bob
[myrepo:/trunk]
@admins = rw
carol = r
";

const FULL_EXAMPLE: &str = "\
# Subversion path-based authorization file

[aliases]
alice = alice.smith

[groups]
admins = &alice, bob
developers = @admins, carol
readers = @developers, dave, erin
locked =

[myrepo:/trunk]
@admins = rw
carol = r
&alice = rw

[myrepo:/branches/release]
@developers = r
erin =

[/serverwide/path]
@developers = r
* = r

[other:/]
@readers = r
";
